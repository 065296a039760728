//! Bulk load of raw JSON into the staging tables.
//!
//! Two loads run in order, each committed on its own: event logs through the configured
//! jsonpaths mapping, then the song catalog with `auto` mapping. Staging tables are not
//! truncated first, so repeated loads append duplicate raw rows. If the song load fails
//! the event rows stay committed.

use crate::config::{Config, S3Config};
use crate::error::EtlError;
use crate::pipeline::{Stage, StageName, StageReport, Step};
use crate::sql::{
    copy::{CopyJson, JsonFormat},
    tables::{STAGING_EVENTS, STAGING_SONGS},
};
use crate::warehouse::Warehouse;

/// Issues the two staging loads.
#[derive(Debug, Clone)]
pub struct StageLoader {
    s3: S3Config,
    iam_role: Option<String>,
}

impl StageLoader {
    /// Loader for the given sources and credential role.
    pub fn new(s3: S3Config, iam_role: Option<String>) -> Self {
        Self { s3, iam_role }
    }

    /// Loader for the `[s3]` and `[iam_role]` sections of `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.s3.clone(), config.iam_role.clone())
    }

    /// The two loads in run order: events, then songs.
    pub fn copies(&self) -> [CopyJson; 2] {
        [
            CopyJson {
                table: &STAGING_EVENTS,
                source: self.s3.log_data.clone(),
                format: self.s3.log_format.clone(),
                iam_role: self.iam_role.clone(),
                region: self.s3.region.clone(),
            },
            CopyJson {
                table: &STAGING_SONGS,
                source: self.s3.song_data.clone(),
                format: JsonFormat::Auto,
                iam_role: self.iam_role.clone(),
                region: self.s3.region.clone(),
            },
        ]
    }

    /// The `load-staging` stage.
    pub fn stage(&self) -> Stage {
        Stage {
            name: StageName::LoadStaging,
            depends_on: vec![StageName::CreateTables],
            steps: self.copies().into_iter().map(Step::CopyJson).collect(),
        }
    }

    /// Run both loads against `warehouse`.
    pub fn load_staging<W: Warehouse + ?Sized>(
        &self,
        warehouse: &mut W,
    ) -> Result<StageReport, EtlError> {
        self.stage().run(warehouse)
    }
}
