use std::io::{self, BufRead, Write};

use yansi::Paint;

use crate::domain::credentials::Credentials;

const LOGO: &str = r#"
  ____                   _
 |  _ \ _   _ _ __   ___| |__
 | |_) | | | | '_ \ / __| '_ \
 |  __/| |_| | | | | (__| | | |
 |_|    \__,_|_| |_|\___|_| |_|
"#;

const CLEAR_SCREEN: &str = "\x1B[2J\x1B[1;1H";

fn flush_stdout() {
    if let Err(e) = io::stdout().flush() {
        log::warn!("Failed to flush stdout: {:?}", e);
    }
}

pub fn clear() {
    print!("{}", CLEAR_SCREEN);
    flush_stdout();
}

pub fn banner() {
    println!("{}", LOGO.bright_green());
}

pub fn note(message: &str) {
    println!("{}", message.bright_black());
}

pub fn success(message: &str) {
    println!("{}", message.green());
}

pub fn error(message: &str) {
    eprintln!("{}", message.red());
}

/// Progress line for a page, drawn on a freshly cleared screen.
fn page_banner(page_number: u32, companies: usize) -> String {
    let line = format!(
        "\n{} 페이지에서 {}개의 회사 정보를 수집 중 ...\n",
        page_number, companies
    );
    format!("{}{}", CLEAR_SCREEN, line.on_green())
}

pub fn page_started(page_number: u32, companies: usize) {
    println!("{}", page_banner(page_number, companies));
    flush_stdout();
}

pub fn fatal_message(error: &anyhow::Error) -> String {
    format!("\n에러 메시지: {:#}", error)
}

pub fn company_collected(name: &str) {
    println!("{}", format!("⌙ 이름: {}", name).bright_blue());
}

/// Asks for the login identifier and the password. The password is not echoed.
pub fn prompt_credentials() -> io::Result<Credentials> {
    println!("{}", "\n\n로켓펀치 계정을 입력하세요 ...".on_green());

    print!("휴대전화 번호 혹은 이메일: ");
    io::stdout().flush()?;
    let mut email_or_phone = String::new();
    io::stdin().lock().read_line(&mut email_or_phone)?;

    let password = rpassword::prompt_password("비밀번호: ")?;

    Ok(Credentials::new(email_or_phone, password))
}
