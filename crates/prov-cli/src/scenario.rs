//! JSON scenario format for `prov generate`.
//!
//! A scenario is a flat description of the bundle and update sequence the
//! document builder needs; it owns none of the builder's invariants (those
//! live in `prov_core::builder`) and only adapts JSON into the typed specs.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use prov_core::config::EngineConfig;
use prov_core::{BundleSpec, EntitySpec, Update, UpdateSource, UpdateSpec};

#[derive(Debug, Deserialize, Serialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: EngineConfig,
    #[serde(default = "default_start_id")]
    pub start_id: i64,
    #[serde(default)]
    pub bundles: Vec<BundleSpecDto>,
    #[serde(default)]
    pub updates: Vec<UpdateDto>,
    #[serde(default)]
    pub invalidate_bundles: Vec<i64>,
}

fn default_start_id() -> i64 {
    1
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BundleSpecDto {
    pub entities: Vec<EntitySpecDto>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct EntitySpecDto {
    pub id: i64,
    #[serde(default)]
    pub has_provenance: Vec<String>,
    #[serde(default)]
    pub derivations: Vec<i64>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateDto {
    pub source: UpdateSourceDto,
    #[serde(default)]
    pub deletions: Vec<i64>,
    #[serde(default)]
    pub new_entities: Vec<EntitySpecDto>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateSourceDto {
    Id(i64),
    Merge { source: i64, into: i64 },
}

impl From<EntitySpecDto> for EntitySpec {
    fn from(dto: EntitySpecDto) -> Self {
        EntitySpec { id: dto.id, has_provenance: dto.has_provenance, derivations: dto.derivations }
    }
}

impl From<BundleSpecDto> for BundleSpec {
    fn from(dto: BundleSpecDto) -> Self {
        BundleSpec::new(dto.entities.into_iter().map(Into::into).collect())
    }
}

impl From<UpdateSourceDto> for UpdateSource {
    fn from(dto: UpdateSourceDto) -> Self {
        match dto {
            UpdateSourceDto::Id(id) => UpdateSource::Id(id),
            UpdateSourceDto::Merge { source, into } => UpdateSource::Merge { source, into },
        }
    }
}

impl From<UpdateDto> for Update {
    fn from(dto: UpdateDto) -> Self {
        Update {
            source: dto.source.into(),
            spec: UpdateSpec { deletions: dto.deletions, new_entities: dto.new_entities.into_iter().map(Into::into).collect() },
        }
    }
}

pub fn parse(raw: &str) -> Result<Scenario> {
    serde_json::from_str(raw).map_err(|e| anyhow!("invalid scenario json: {e}"))
}
