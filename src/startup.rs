use anyhow::Context;

use crate::{
    configuration::Settings,
    console,
    services::{auth, company_scraper, CsvExport, Droid},
};

pub async fn run(configuration: Settings) -> anyhow::Result<()> {
    console::clear();
    console::banner();

    let base_url = configuration
        .site
        .base_url()
        .context("Invalid site base url")?;
    let droid = Droid::new(&configuration.browser, base_url.clone())
        .context("Failed to build browser capabilities")?;
    console::note(&format!("WebDriver: {}", droid.server_url()));
    log::info!("Using WebDriver at {}", droid.server_url());

    let credentials = tokio::task::spawn_blocking(console::prompt_credentials)
        .await
        .context("Credential prompt panicked")?
        .context("Failed to read credentials")?;

    let scraper = &configuration.scraper;
    if let Err(e) = auth::login(
        &droid,
        &base_url,
        &credentials,
        scraper.wait_timeout(),
        scraper.login_timeout(),
    )
    .await
    {
        console::error("로그인에 실패하였습니다. (아이디와 비밀번호를 확인해주세요)");
        return Err(e.into());
    }

    console::clear();
    console::success("\n\n✅ 로그인에 성공하였습니다.\n");

    let export = CsvExport::new(&configuration.output.path);
    let snapshot = configuration.output.write_every_page.then_some(&export);
    let report = company_scraper::crawl(&droid, &base_url, scraper, snapshot).await;

    console::success(&format!(
        "\n\n✅ 작업이 완료되었습니다. 총 {}개의 페이지에서 {}개의 회사 정보를 수집했습니다.",
        report.pages_visited,
        report.companies.len()
    ));
    log::info!(
        "Crawl finished: {} pages, {} failed, {} companies",
        report.pages_visited,
        report.failed_pages,
        report.companies.len()
    );

    export
        .write_all(&report.companies)
        .with_context(|| format!("Failed to write {:?}", export.path()))?;
    console::success("\n✅ CSV 파일로 저장되었습니다.");

    Ok(())
}
