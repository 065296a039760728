//! Stock pipelines assembled from the three components.

use super::{Pipeline, PipelineError};
use crate::config::Config;
use crate::schema_manager::SchemaManager;
use crate::stage_loader::StageLoader;
use crate::transform::TransformEngine;

impl Pipeline {
    /// Default run: load staging, then build the star schema. Tables must exist.
    pub fn etl(config: &Config) -> Result<Self, PipelineError> {
        let dialect = config.dialect();
        Pipeline::new(
            dialect,
            vec![
                StageLoader::from_config(config).stage(),
                TransformEngine::new(dialect).stage(),
            ],
        )
    }

    /// Destructive schema reset: drop, then create all tables.
    pub fn reset(config: &Config) -> Result<Self, PipelineError> {
        let schema = SchemaManager::new(config.dialect());
        Pipeline::new(
            config.dialect(),
            vec![schema.drop_stage(), schema.create_stage()],
        )
    }

    /// Reset followed by the default run.
    pub fn full(config: &Config) -> Result<Self, PipelineError> {
        let dialect = config.dialect();
        let schema = SchemaManager::new(dialect);
        Pipeline::new(
            dialect,
            vec![
                schema.drop_stage(),
                schema.create_stage(),
                StageLoader::from_config(config).stage(),
                TransformEngine::new(dialect).stage(),
            ],
        )
    }
}
