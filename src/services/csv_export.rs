use std::path::{Path, PathBuf};

use crate::{domain::company::CompanyDetail, error::ScrapeError};

pub struct CsvExport {
    path: PathBuf,
}

impl CsvExport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvExport { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrites the whole file. The header comes from the first record, so an
    /// empty slice leaves an empty file behind.
    pub fn write_all(&self, companies: &[CompanyDetail]) -> Result<(), ScrapeError> {
        let mut writer = csv::Writer::from_path(&self.path)?;

        for company in companies {
            writer.serialize(company)?;
        }
        writer.flush()?;

        match companies.is_empty() {
            true => log::warn!("No companies collected, wrote empty {:?}", self.path),
            false => log::info!("Wrote {} companies to {:?}", companies.len(), self.path),
        }

        Ok(())
    }
}
