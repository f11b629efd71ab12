//! Named abilities.

use std::collections::BTreeMap;
use std::path::Path;

use sealpack_client::AbilityConfig;

use crate::ability::Ability;
use crate::error::{Result, SealError};

/// A set of abilities keyed by name.
///
/// A registry is an ordinary owned value. Build one at startup and pass it
/// where it is needed.
#[derive(Debug, Default)]
pub struct AbilityRegistry {
    abilities: BTreeMap<String, Ability>,
}

impl AbilityRegistry {
    /// Build an HTTP-backed ability for every named config.
    pub fn new<I>(configs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, AbilityConfig)>,
    {
        let abilities = configs
            .into_iter()
            .map(|(name, config)| {
                let ability = Ability::new(config)
                    .map_err(|e| SealError::Config(format!("{name}: {e}")))?;
                Ok((name, ability))
            })
            .collect::<Result<_>>()?;
        Ok(Self { abilities })
    }

    /// A registry of already built abilities.
    pub fn from_abilities<I>(abilities: I) -> Self
    where
        I: IntoIterator<Item = (String, Ability)>,
    {
        Self {
            abilities: abilities.into_iter().collect(),
        }
    }

    /// Build from a TOML table of named abilities.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Self::new(AbilityConfig::named_from_toml_str(raw)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(AbilityConfig::named_from_file(path)?)
    }

    /// Look up an ability.
    ///
    /// With no name, the only configured ability is returned. Naming is
    /// required once more than one is configured.
    pub fn get(&self, name: Option<&str>) -> Result<&Ability> {
        match name {
            Some(name) => self
                .abilities
                .get(name)
                .ok_or_else(|| SealError::UnknownAbility(name.to_string())),
            None => {
                let mut abilities = self.abilities.values();
                match (abilities.next(), abilities.next()) {
                    (Some(only), None) => Ok(only),
                    _ => Err(SealError::ConfigKeyMissing),
                }
            }
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.abilities.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }
}
