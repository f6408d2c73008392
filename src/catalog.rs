//! Entity catalog: canonical state, district and crop names with their aliases.
//!
//! The catalog is versioned configuration. It is loaded once (from the
//! embedded default or a JSON file) and then shared read-only, usually behind
//! an `Arc`. All matching happens on text normalized by [`normalize_text`].

use crate::error::{AgriError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

const BUILTIN_CATALOG: &str = include_str!("../metadata/catalog.json");

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CatalogDocument {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub states: Vec<StateEntry>,
    #[serde(default)]
    pub districts: Vec<DistrictEntry>,
    #[serde(default)]
    pub crops: Vec<CropEntry>,
    #[serde(default)]
    pub crop_groups: Vec<CropGroupEntry>,
    /// Capitalized words that look like places but are not catalog entities.
    #[serde(default)]
    pub ignored_terms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateEntry {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistrictEntry {
    pub name: String,
    pub state: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropEntry {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub water_need: Option<WaterNeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropGroupEntry {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WaterNeed {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    State,
    District,
    CropGroup,
    Crop,
}

/// One catalog hit inside a normalized question.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMatch {
    pub kind: EntityKind,
    /// Canonical name; for a crop group, the group name.
    pub canonical: String,
    /// Canonical crops a group expands to. Empty for other kinds.
    pub members: Vec<String>,
    /// Byte span in the normalized text.
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone)]
struct Surface {
    text: String,
    kind: EntityKind,
    canonical: String,
    members: Vec<String>,
}

/// Immutable lookup structure built from a [`CatalogDocument`].
#[derive(Debug, Clone)]
pub struct EntityCatalog {
    document: CatalogDocument,
    lexicon: Vec<Surface>,
    ignored: HashSet<String>,
    water_needs: HashMap<String, WaterNeed>,
}

impl EntityCatalog {
    /// The catalog embedded in the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AgriError::Catalog(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&content)
            .map_err(|e| AgriError::Catalog(format!("Failed to parse {}: {}", path.display(), e)))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let document: CatalogDocument = serde_json::from_str(content)?;
        Self::from_document(document)
    }

    pub fn from_document(document: CatalogDocument) -> Result<Self> {
        let mut lexicon = Vec::new();
        let mut owners: HashMap<String, (EntityKind, String)> = HashMap::new();

        let mut register = |surface: &str,
                            kind: EntityKind,
                            canonical: &str,
                            members: &[String],
                            lexicon: &mut Vec<Surface>|
         -> Result<()> {
            let text = normalize_text(surface);
            if text.is_empty() {
                return Err(AgriError::Catalog(format!(
                    "Empty name or alias for {}",
                    canonical
                )));
            }
            match owners.get(&text) {
                Some((owner_kind, owner)) if owner_kind == &kind && owner == canonical => {
                    return Ok(());
                }
                Some((owner_kind, owner)) => {
                    return Err(AgriError::Catalog(format!(
                        "'{}' is claimed by both {:?} {} and {:?} {}",
                        surface, owner_kind, owner, kind, canonical
                    )));
                }
                None => {}
            }
            owners.insert(text.clone(), (kind, canonical.to_string()));
            lexicon.push(Surface {
                text,
                kind,
                canonical: canonical.to_string(),
                members: members.to_vec(),
            });
            Ok(())
        };

        for state in &document.states {
            register(&state.name, EntityKind::State, &state.name, &[], &mut lexicon)?;
            for alias in &state.aliases {
                register(alias, EntityKind::State, &state.name, &[], &mut lexicon)?;
            }
        }

        let state_names: HashSet<&str> = document.states.iter().map(|s| s.name.as_str()).collect();
        for district in &document.districts {
            if !state_names.contains(district.state.as_str()) {
                return Err(AgriError::Catalog(format!(
                    "District {} refers to unknown state {}",
                    district.name, district.state
                )));
            }
            register(&district.name, EntityKind::District, &district.name, &[], &mut lexicon)?;
            for alias in &district.aliases {
                register(alias, EntityKind::District, &district.name, &[], &mut lexicon)?;
            }
        }

        for crop in &document.crops {
            register(&crop.name, EntityKind::Crop, &crop.name, &[], &mut lexicon)?;
            for alias in &crop.aliases {
                register(alias, EntityKind::Crop, &crop.name, &[], &mut lexicon)?;
            }
        }

        let crop_names: HashSet<&str> = document.crops.iter().map(|c| c.name.as_str()).collect();
        for group in &document.crop_groups {
            if let Some(unknown) = group.members.iter().find(|m| !crop_names.contains(m.as_str())) {
                return Err(AgriError::Catalog(format!(
                    "Crop group {} lists unknown crop {}",
                    group.name, unknown
                )));
            }
            register(&group.name, EntityKind::CropGroup, &group.name, &group.members, &mut lexicon)?;
            for alias in &group.aliases {
                register(alias, EntityKind::CropGroup, &group.name, &group.members, &mut lexicon)?;
            }
        }

        // Longest surface first so "uttar pradesh" claims its span before any
        // shorter entry could; ties fall back to kind then text for a stable order.
        lexicon.sort_by(|a, b| {
            b.text
                .len()
                .cmp(&a.text.len())
                .then(a.kind.cmp(&b.kind))
                .then(a.text.cmp(&b.text))
        });

        let ignored = document
            .ignored_terms
            .iter()
            .map(|t| normalize_text(t))
            .collect();
        let water_needs = document
            .crops
            .iter()
            .filter_map(|c| c.water_need.map(|need| (c.name.clone(), need)))
            .collect();

        debug!(
            version = %document.version,
            surfaces = lexicon.len(),
            "Entity catalog loaded"
        );

        Ok(Self {
            document,
            lexicon,
            ignored,
            water_needs,
        })
    }

    pub fn version(&self) -> &str {
        &self.document.version
    }

    /// Scan normalized text for catalog entries.
    ///
    /// Longest-match-first at word boundaries; a span claimed by a longer
    /// entry cannot be reused by a shorter one. Matches are returned in text
    /// order.
    pub fn scan(&self, normalized: &str) -> Vec<EntityMatch> {
        let padded = format!(" {} ", normalized);
        let mut claimed: Vec<(usize, usize)> = Vec::new();
        let mut matches = Vec::new();

        for surface in &self.lexicon {
            let needle = format!(" {} ", surface.text);
            let mut from = 0;
            while let Some(pos) = padded[from..].find(&needle) {
                let start = from + pos;
                // Span in the unpadded text: skip the leading pad space.
                let span = (start, start + surface.text.len());
                let overlaps = claimed.iter().any(|&(s, e)| span.0 < e && s < span.1);
                if !overlaps {
                    claimed.push(span);
                    matches.push(EntityMatch {
                        kind: surface.kind,
                        canonical: surface.canonical.clone(),
                        members: surface.members.clone(),
                        start: span.0,
                        end: span.1,
                    });
                }
                from = start + 1;
            }
        }

        matches.sort_by_key(|m| m.start);
        matches
    }

    /// Canonical state name for any spelling or alias, case-insensitively.
    pub fn canonical_state(&self, name: &str) -> Option<&str> {
        self.canonical(name, EntityKind::State)
    }

    pub fn canonical_crop(&self, name: &str) -> Option<&str> {
        self.canonical(name, EntityKind::Crop)
    }

    pub fn canonical_district(&self, name: &str) -> Option<&str> {
        self.canonical(name, EntityKind::District)
    }

    fn canonical(&self, name: &str, kind: EntityKind) -> Option<&str> {
        let text = normalize_text(name);
        self.lexicon
            .iter()
            .find(|s| s.kind == kind && s.text == text)
            .map(|s| s.canonical.as_str())
    }

    pub fn water_need(&self, crop: &str) -> Option<WaterNeed> {
        self.water_needs.get(crop).copied()
    }

    /// Canonical crops with the given water need, in catalog order.
    pub fn crops_with_water_need(&self, need: WaterNeed) -> Vec<String> {
        self.document
            .crops
            .iter()
            .filter(|c| c.water_need == Some(need))
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn is_ignored(&self, phrase: &str) -> bool {
        self.ignored.contains(&normalize_text(phrase))
    }

    /// Every canonical name with its kind, for suggestion lookups.
    pub fn canonical_names(&self) -> Vec<(EntityKind, &str)> {
        let mut names: Vec<(EntityKind, &str)> = Vec::new();
        names.extend(self.document.states.iter().map(|s| (EntityKind::State, s.name.as_str())));
        names.extend(
            self.document
                .districts
                .iter()
                .map(|d| (EntityKind::District, d.name.as_str())),
        );
        names.extend(self.document.crops.iter().map(|c| (EntityKind::Crop, c.name.as_str())));
        names
    }
}

/// Lowercase, replace punctuation with spaces, collapse whitespace.
pub fn normalize_text(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whole-word (or whole-phrase) containment on normalized text.
pub fn contains_phrase(normalized: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return false;
    }
    format!(" {} ", normalized).contains(&format!(" {} ", phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> EntityCatalog {
        EntityCatalog::builtin().unwrap()
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Uttar   PRADESH? "), "uttar pradesh");
        assert_eq!(normalize_text("Jammu & Kashmir"), "jammu kashmir");
        assert_eq!(normalize_text("2015-2020"), "2015 2020");
    }

    #[test]
    fn test_longest_match_first() {
        let catalog = catalog();
        let hits = catalog.scan(&normalize_text("Rice in Uttar Pradesh and Madhya Pradesh"));
        let states: Vec<&str> = hits
            .iter()
            .filter(|m| m.kind == EntityKind::State)
            .map(|m| m.canonical.as_str())
            .collect();
        assert_eq!(states, vec!["Uttar Pradesh", "Madhya Pradesh"]);
        assert!(hits.iter().any(|m| m.kind == EntityKind::Crop && m.canonical == "Rice"));
    }

    #[test]
    fn test_group_beats_member_alias() {
        let catalog = catalog();
        let hits = catalog.scan("promote pearl millet and millets");
        assert_eq!(hits[0].kind, EntityKind::Crop);
        assert_eq!(hits[0].canonical, "Bajra");
        assert_eq!(hits[1].kind, EntityKind::CropGroup);
        assert_eq!(hits[1].members, vec!["Bajra", "Jowar", "Ragi"]);
    }

    #[test]
    fn test_word_boundaries() {
        let catalog = catalog();
        // "goa" must not fire inside "goal", "gram" not inside "program".
        let hits = catalog.scan("our goal for the program");
        assert!(hits.is_empty());
    }

    #[test]
    fn test_canonical_names_round_trip_any_case() {
        let catalog = catalog();
        for (kind, name) in catalog.canonical_names() {
            for variant in [name.to_string(), name.to_uppercase(), name.to_lowercase()] {
                let hits = catalog.scan(&normalize_text(&variant));
                assert_eq!(hits.len(), 1, "{} should match exactly once", variant);
                assert_eq!(hits[0].kind, kind);
                assert_eq!(hits[0].canonical, name);
            }
        }
    }

    #[test]
    fn test_aliases_resolve() {
        let catalog = catalog();
        assert_eq!(catalog.canonical_state("ORISSA"), Some("Odisha"));
        assert_eq!(catalog.canonical_crop("paddy"), Some("Rice"));
        assert_eq!(catalog.canonical_district("belgaum"), Some("Belagavi"));
    }

    #[test]
    fn test_rejects_conflicting_alias() {
        let doc = r#"{
            "version": "t",
            "states": [{ "name": "Punjab", "aliases": [] }],
            "crops": [{ "name": "Punjab", "aliases": [] }]
        }"#;
        let err = EntityCatalog::from_json(doc).unwrap_err();
        assert!(matches!(err, AgriError::Catalog(_)));
    }

    #[test]
    fn test_water_need_lookup() {
        let catalog = catalog();
        assert_eq!(catalog.water_need("Rice"), Some(WaterNeed::High));
        let low = catalog.crops_with_water_need(WaterNeed::Low);
        assert!(low.contains(&"Bajra".to_string()));
        assert!(!low.contains(&"Sugarcane".to_string()));
    }
}
