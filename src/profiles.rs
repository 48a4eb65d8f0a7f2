/// Rotation profile library — embedded at compile time from `data/profiles/*.toml`.
///
/// A profile is a job's action table in priority order. Each entry is turned
/// into a validated `ActionDefinition` through the builder, so a malformed
/// entry (zero charges, bad recast, duplicate id) is reported here, before
/// the engine ever evaluates it.
use crate::{
    action::{ActionDefinition, ActionId},
    cooldown::Recast,
    error::ConfigError,
    registry::ActionRegistry,
    status::StatusId,
};
use once_cell::sync::Lazy;
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Embedded TOML data
// ---------------------------------------------------------------------------

const WHITE_MAGE: &str = include_str!("../data/profiles/white_mage.toml");
const BLACK_MAGE: &str = include_str!("../data/profiles/black_mage.toml");
const BARD:       &str = include_str!("../data/profiles/bard.toml");

static ALL_PROFILE_DATA: &[&str] = &[WHITE_MAGE, BLACK_MAGE, BARD];

/// Parsed once on first use. Files that fail to parse are logged and skipped.
static EMBEDDED: Lazy<Vec<TomlProfile>> = Lazy::new(|| {
    ALL_PROFILE_DATA
        .iter()
        .filter_map(|raw| {
            toml::from_str::<TomlFile>(raw)
                .map_err(|e| tracing::warn!("Failed to parse profile TOML: {}", e))
                .ok()
                .map(|f| f.profile)
        })
        .collect()
});

// ---------------------------------------------------------------------------
// TOML deserialization structs (private)
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct TomlFile {
    profile: TomlProfile,
}

#[derive(Deserialize, Clone)]
struct TomlProfile {
    job:         String,
    name:        String,
    role:        String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    actions:     Vec<TomlAction>,
}

#[derive(Deserialize, Clone)]
struct TomlAction {
    name:                String,
    id:                  ActionId,
    level:               u8,
    #[serde(default)]
    ability:             bool,
    #[serde(default)]
    mp_cost:             u32,
    #[serde(default)]
    forbidden_after:     Vec<ActionId>,
    buff_needed:         Option<StatusId>,
    #[serde(default)]
    buffs_provided:      Vec<StatusId>,
    #[serde(default)]
    target_debuffs:      Vec<StatusId>,
    #[serde(default)]
    require_all_debuffs: bool,
    recast:              Option<Recast>,
}

impl TomlAction {
    fn build(self) -> Result<ActionDefinition, ConfigError> {
        let mut b = ActionDefinition::builder(self.id, self.level)
            .name(self.name)
            .mp_cost(self.mp_cost)
            .forbidden_after(self.forbidden_after)
            .buffs_provided(self.buffs_provided)
            .target_debuffs(self.target_debuffs);
        if self.ability {
            b = b.ability();
        }
        if let Some(buff) = self.buff_needed {
            b = b.buff_needed(buff);
        }
        if self.require_all_debuffs {
            b = b.require_all_debuffs();
        }
        if let Some(recast) = self.recast {
            b = b.recast(recast);
        }
        b.build()
    }
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A fully-validated rotation profile.
#[derive(Debug, Clone)]
pub struct RotationProfile {
    pub job:         String,
    pub name:        String,
    pub role:        String,
    pub description: String,
    /// Priority order, highest first.
    pub actions:     Vec<ActionDefinition>,
}

impl RotationProfile {
    /// Register every action in order. Fails on the first duplicate id.
    pub fn into_registry(self) -> Result<ActionRegistry, ConfigError> {
        let mut registry = ActionRegistry::new();
        for def in self.actions {
            registry.register(def)?;
        }
        tracing::info!("Loaded profile {} ({} actions)", self.job, registry.len());
        Ok(registry)
    }
}

/// Lightweight descriptor for listings.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProfileInfo {
    pub job:     String,
    pub name:    String,
    pub role:    String,
    pub actions: usize,
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

fn validate(doc: TomlProfile) -> Result<RotationProfile, ConfigError> {
    let actions = doc
        .actions
        .into_iter()
        .map(TomlAction::build)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RotationProfile {
        job:         doc.job,
        name:        doc.name,
        role:        doc.role,
        description: doc.description,
        actions,
    })
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse a profile from TOML text (user-supplied or embedded).
pub fn parse(raw: &str) -> Result<RotationProfile, ConfigError> {
    let file: TomlFile = toml::from_str(raw).map_err(|e| ConfigError::ProfileParse(e.to_string()))?;
    validate(file.profile)
}

/// All embedded profiles.
pub fn list_all() -> Vec<ProfileInfo> {
    EMBEDDED
        .iter()
        .map(|p| ProfileInfo {
            job:     p.job.clone(),
            name:    p.name.clone(),
            role:    p.role.clone(),
            actions: p.actions.len(),
        })
        .collect()
}

/// Load an embedded profile by job abbreviation (case-insensitive).
pub fn load(job: &str) -> Result<RotationProfile, ConfigError> {
    let doc = EMBEDDED
        .iter()
        .find(|p| p.job.eq_ignore_ascii_case(job))
        .cloned()
        .ok_or_else(|| ConfigError::UnknownProfile(job.to_owned()))?;
    validate(doc)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_three_profiles() {
        let jobs: Vec<String> = list_all().into_iter().map(|p| p.job).collect();
        assert_eq!(jobs.len(), 3);
        for job in ["WHM", "BLM", "BRD"] {
            assert!(jobs.iter().any(|j| j == job), "{job}");
        }
    }

    #[test]
    fn every_embedded_profile_registers() {
        for info in list_all() {
            let registry = load(&info.job).unwrap().into_registry().unwrap();
            assert_eq!(registry.len(), info.actions);
        }
    }

    #[test]
    fn loads_white_mage_rules() {
        let p = load("whm").expect("case-insensitive");
        let aero = p.actions.iter().find(|a| a.id() == 121).unwrap();
        assert_eq!(aero.name(), "Aero");
        assert_eq!(aero.target_debuffs(), &[143]);
        assert_eq!(aero.forbidden_after(), &[132]);
        assert!(!aero.is_ability());

        let pom = p.actions.iter().find(|a| a.id() == 136).unwrap();
        assert!(pom.is_ability());
        assert_eq!(pom.recast(), Some(Recast::single(120.0)));
    }

    #[test]
    fn loads_multi_charge_recast() {
        let p = load("BRD").unwrap();
        let bl = p.actions.iter().find(|a| a.name() == "Bloodletter").unwrap();
        assert_eq!(bl.recast(), Some(Recast { one_charge: 15.0, max_charges: 3 }));
        let jaws = p.actions.iter().find(|a| a.id() == 3560).unwrap();
        assert!(jaws.require_all_debuffs());
    }

    #[test]
    fn unknown_profile() {
        assert_eq!(load("MCH").unwrap_err(), ConfigError::UnknownProfile("MCH".to_owned()));
    }

    #[test]
    fn rejects_zero_charges() {
        let raw = r#"
            [profile]
            job  = "TST"
            name = "Test"
            role = "none"

            [[profile.actions]]
            name    = "Broken"
            id      = 9
            level   = 1
            ability = true
            recast  = { one_charge = 30.0, max_charges = 0 }
        "#;
        assert_eq!(parse(raw).unwrap_err(), ConfigError::ZeroCharges { action: 9 });
    }

    #[test]
    fn rejects_duplicate_ids_at_registration() {
        let raw = r#"
            [profile]
            job  = "TST"
            name = "Test"
            role = "none"

            [[profile.actions]]
            name  = "A"
            id    = 9
            level = 1

            [[profile.actions]]
            name  = "B"
            id    = 9
            level = 1
        "#;
        let profile = parse(raw).unwrap();
        assert_eq!(profile.into_registry().unwrap_err(), ConfigError::DuplicateAction(9));
    }

    #[test]
    fn reports_syntax_errors() {
        assert!(matches!(parse("[profile"), Err(ConfigError::ProfileParse(_))));
    }
}
