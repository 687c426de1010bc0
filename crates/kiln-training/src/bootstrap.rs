use crate::context::RunContext;
use crate::error::{TrainingError, TrainingResult};
use crate::model::{DataLoader, Model};
use crate::sections::{DATALOADER, MODEL, OPTIM, TRAINER, TRAIN_DATASET};
use crate::trainer::TrainingDriver;
use kiln_config::{ConfigError, ResolvedConfig};
use serde::de::DeserializeOwned;

/// Collaborators built from one resolved configuration, ready for `run`.
pub struct Bootstrapped<M: Model, T> {
    pub model: M,
    pub loader: M::Loader,
    pub trainer: T,
}

fn decode<S: DeserializeOwned>(
    config: &ResolvedConfig,
    section: &str,
    wrap: fn(String) -> TrainingError,
) -> TrainingResult<S> {
    config.section(section).map_err(|err| match err {
        ConfigError::SectionDecode { .. } => wrap(err.to_string()),
        other => TrainingError::Config(other),
    })
}

/// Construct model, data loader, optimizer and trainer, in that order.
///
/// The first failure stops the sequence; nothing after it is constructed.
pub fn bootstrap<M, T>(config: &ResolvedConfig, ctx: RunContext) -> TrainingResult<Bootstrapped<M, T>>
where
    M: Model,
    T: TrainingDriver,
{
    tracing::info!("Application settings\n{}", config.to_toml_string()?);

    let model_config = decode::<M::Config>(config, MODEL, TrainingError::ModelConstruction)?;
    let mut model = M::from_config(model_config)?;
    tracing::debug!("model constructed");

    let loader_config = decode::<M::DataLoaderConfig>(config, DATALOADER, TrainingError::DataLoaderConstruction)?;
    let dataset_config = decode::<M::DatasetConfig>(config, TRAIN_DATASET, TrainingError::DataLoaderConstruction)?;
    let loader = model.instantiate_dataloader(&loader_config, &dataset_config)?;
    tracing::debug!(batches = loader.len(), "data loader constructed");

    // Optimizer and trainer sections have no construction variant of their
    // own; a decode failure there stays a `ConfigError::SectionDecode`.
    let optim_config: M::OptimConfig = config.section(OPTIM)?;
    model.setup_optimization(&optim_config)?;

    let options: T::Options = config.section(TRAINER)?;
    let trainer = T::from_options(options, ctx)?;
    tracing::debug!("trainer constructed");

    Ok(Bootstrapped { model, loader, trainer })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_config::{resolve, FieldType, OverrideSource, Schema};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Narrow {
        #[allow(dead_code)]
        width: u32,
    }

    fn config() -> ResolvedConfig {
        let model = Schema::builder("model")
            .field("width", FieldType::Integer, 4)
            .field("depth", FieldType::Integer, 2)
            .build()
            .unwrap();
        let schema = Schema::builder("app").section("model", model).build().unwrap();
        resolve(&schema, &OverrideSource::new()).unwrap()
    }

    #[test]
    fn test_section_mismatch_maps_to_construction_error() {
        let err = decode::<Narrow>(&config(), MODEL, TrainingError::ModelConstruction).unwrap_err();
        assert!(matches!(err, TrainingError::ModelConstruction(ref msg) if msg.contains("depth")), "{err}");
    }

    #[test]
    fn test_absent_section_stays_config_error() {
        let err = decode::<Narrow>(&config(), OPTIM, TrainingError::ModelConstruction).unwrap_err();
        assert!(matches!(err, TrainingError::Config(ConfigError::UnknownField { .. })));
    }
}
