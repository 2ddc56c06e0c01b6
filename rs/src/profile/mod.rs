use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Access tag values that deny routability once they win the access chain
/// (spec.md §4.4). The exact set is an open question in spec.md §9;
/// this crate's answer is exposed as a constant for test control.
pub const DENY_ACCESS_VALUES: &[&str] = &[
    "no",
    "private",
    "agricultural",
    "forestry",
    "emergency",
    "customers",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PenaltyRule {
    pub key: String,
    pub value: String,
    pub multiplier: f32,
}

impl PenaltyRule {
    fn new(key: &str, value: &str, multiplier: f32) -> PenaltyRule {
        PenaltyRule {
            key: key.to_string(),
            value: value.to_string(),
            multiplier,
        }
    }
}

/// A mode-specific cost profile (spec.md §3, §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    /// Checked in order; the first exact `(key, value)` match wins.
    pub penalties: Vec<PenaltyRule>,
    /// Ordered least-to-most specific; the last tag *present* on a way decides access.
    pub access: Vec<String>,
    pub disallow_motorroad: bool,
    pub disable_restrictions: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestrictionKind {
    Prohibitory,
    Mandatory,
}

/// Outcome of evaluating a way against a profile: the cost multiplier and
/// which directions are traversable.
pub struct WayDecision {
    pub multiplier: f32,
    pub forward: bool,
    pub backward: bool,
}

impl Profile {
    pub fn evaluate_way(&self, tags: &HashMap<String, String>) -> Option<WayDecision> {
        if self.disallow_motorroad && tags.get("motorroad").map(String::as_str) == Some("yes") {
            return None;
        }
        if !self.is_accessible(tags) {
            return None;
        }

        let multiplier = match self
            .penalties
            .iter()
            .find(|rule| tags.get(&rule.key).map(String::as_str) == Some(rule.value.as_str()))
        {
            Some(rule) => rule.multiplier,
            None => {
                log::warn!(
                    target: "osm",
                    "profile {}: no penalty rule matched way tags {:?}",
                    self.name,
                    tags
                );
                return None;
            }
        };

        let (forward, backward) = self.oneway_direction(tags);
        if !forward && !backward {
            return None;
        }

        Some(WayDecision {
            multiplier,
            forward,
            backward,
        })
    }

    /// Walks the access chain in order; the last tag present decides. No
    /// access tag present at all means accessible by default.
    fn is_accessible(&self, tags: &HashMap<String, String>) -> bool {
        let mut verdict = true;
        for tag in &self.access {
            if let Some(value) = tags.get(tag) {
                verdict = !DENY_ACCESS_VALUES.contains(&value.as_str());
            }
        }
        verdict
    }

    /// The last access-chain tag actually present on the way — used both to
    /// decide accessibility and to build the mode-specific `oneway:<mode>` key.
    fn most_specific_present_access_tag(&self, tags: &HashMap<String, String>) -> Option<&str> {
        self.access
            .iter()
            .rev()
            .find(|tag| tags.contains_key(tag.as_str()))
            .map(String::as_str)
    }

    fn oneway_direction(&self, tags: &HashMap<String, String>) -> (bool, bool) {
        if let Some(junction) = tags.get("junction") {
            if junction == "roundabout" || junction == "circular" {
                return (true, false);
            }
        }

        let mode_key = self
            .most_specific_present_access_tag(tags)
            .map(|tag| format!("oneway:{}", tag));
        let mode_specific = mode_key.as_deref().and_then(|key| tags.get(key));

        let relevant = if self.name == "foot" {
            mode_specific.or_else(|| {
                let is_footway_like = matches!(
                    tags.get("highway").map(String::as_str),
                    Some("footway") | Some("path") | Some("pedestrian") | Some("steps")
                );
                is_footway_like.then(|| tags.get("oneway")).flatten()
            })
        } else {
            mode_specific.or_else(|| tags.get("oneway"))
        };

        match relevant.map(String::as_str) {
            Some("yes") | Some("true") | Some("1") => (true, false),
            Some("-1") | Some("reverse") => (false, true),
            _ => (true, true),
        }
    }

    /// Resolves a restriction relation's tags to `(kind, applicable)`.
    /// `restriction:<mode>` tags take priority over the generic `restriction`
    /// tag, checked most-specific-access-tag first (spec.md §4.5).
    pub fn restriction_kind(&self, tags: &HashMap<String, String>) -> Option<RestrictionKind> {
        let value = self
            .access
            .iter()
            .rev()
            .find_map(|mode| tags.get(&format!("restriction:{}", mode)))
            .or_else(|| tags.get("restriction"))?;

        if value.starts_with("no_") {
            Some(RestrictionKind::Prohibitory)
        } else if value.starts_with("only_") {
            Some(RestrictionKind::Mandatory)
        } else {
            None
        }
    }

    /// `except=<mode>;<mode>;...` exempts a restriction from this profile
    /// when one of the listed modes is this profile's name or one of the
    /// tags it consults (supplemented from `original_source/`, spec.md §4.5).
    pub fn is_exempted(&self, tags: &HashMap<String, String>) -> bool {
        let Some(except) = tags.get("except") else {
            return false;
        };
        except.split(';').map(str::trim).any(|mode| {
            mode == self.name || self.access.iter().any(|tag| tag == mode)
        })
    }
}

fn penalties(rules: &[(&str, &str, f32)]) -> Vec<PenaltyRule> {
    rules
        .iter()
        .map(|(k, v, m)| PenaltyRule::new(k, v, *m))
        .collect()
}

fn strs(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

pub fn car() -> Profile {
    Profile {
        name: "car".to_string(),
        access: strs(&["access", "vehicle", "motor_vehicle", "motorcar"]),
        disallow_motorroad: false,
        disable_restrictions: false,
        penalties: penalties(&[
            ("highway", "motorway", 1.0),
            ("highway", "motorway_link", 1.0),
            ("highway", "trunk", 1.05),
            ("highway", "trunk_link", 1.05),
            ("highway", "primary", 1.1),
            ("highway", "primary_link", 1.1),
            ("highway", "secondary", 1.15),
            ("highway", "secondary_link", 1.15),
            ("highway", "tertiary", 1.2),
            ("highway", "tertiary_link", 1.2),
            ("highway", "unclassified", 1.3),
            ("highway", "residential", 1.3),
            ("highway", "living_street", 1.5),
            ("highway", "service", 1.6),
        ]),
    }
}

pub fn bus() -> Profile {
    Profile {
        name: "bus".to_string(),
        access: strs(&["access", "vehicle", "motor_vehicle", "psv", "bus"]),
        disallow_motorroad: false,
        disable_restrictions: false,
        penalties: penalties(&[
            ("highway", "motorway", 1.0),
            ("highway", "trunk", 1.05),
            ("highway", "primary", 1.1),
            ("highway", "secondary", 1.15),
            ("highway", "tertiary", 1.2),
            ("highway", "unclassified", 1.3),
            ("highway", "residential", 1.3),
            ("highway", "living_street", 1.5),
            ("highway", "service", 1.6),
            ("highway", "bus_guideway", 1.0),
        ]),
    }
}

pub fn bicycle() -> Profile {
    Profile {
        name: "bicycle".to_string(),
        access: strs(&["access", "vehicle", "bicycle"]),
        disallow_motorroad: true,
        disable_restrictions: false,
        penalties: penalties(&[
            ("highway", "cycleway", 1.0),
            ("highway", "path", 1.2),
            ("highway", "track", 1.3),
            ("highway", "living_street", 1.3),
            ("highway", "residential", 1.3),
            ("highway", "unclassified", 1.4),
            ("highway", "tertiary", 1.4),
            ("highway", "service", 1.5),
            ("highway", "secondary", 1.6),
            ("highway", "primary", 2.0),
        ]),
    }
}

pub fn foot() -> Profile {
    Profile {
        name: "foot".to_string(),
        access: strs(&["access", "foot"]),
        disallow_motorroad: true,
        disable_restrictions: false,
        penalties: penalties(&[
            ("highway", "footway", 1.0),
            ("highway", "pedestrian", 1.0),
            ("highway", "path", 1.1),
            ("highway", "steps", 1.3),
            ("highway", "living_street", 1.1),
            ("highway", "residential", 1.2),
            ("highway", "track", 1.2),
            ("highway", "unclassified", 1.3),
            ("highway", "service", 1.3),
            ("highway", "tertiary", 1.4),
            ("highway", "secondary", 1.6),
            ("highway", "primary", 2.0),
        ]),
    }
}

pub fn railway() -> Profile {
    Profile {
        name: "railway".to_string(),
        access: strs(&["access", "railway"]),
        disallow_motorroad: false,
        disable_restrictions: false,
        penalties: penalties(&[
            ("railway", "rail", 1.0),
            ("railway", "light_rail", 1.1),
            ("railway", "narrow_gauge", 1.2),
        ]),
    }
}

pub fn tram() -> Profile {
    Profile {
        name: "tram".to_string(),
        access: strs(&["access", "railway", "tram"]),
        disallow_motorroad: false,
        disable_restrictions: false,
        penalties: penalties(&[("railway", "tram", 1.0)]),
    }
}

pub fn subway() -> Profile {
    Profile {
        name: "subway".to_string(),
        access: strs(&["access", "railway", "subway"]),
        disallow_motorroad: false,
        disable_restrictions: false,
        penalties: penalties(&[("railway", "subway", 1.0)]),
    }
}

/// The built-in profile registry, selectable by name (spec.md §6).
pub fn registry() -> HashMap<&'static str, Profile> {
    let mut map = HashMap::new();
    map.insert("car", car());
    map.insert("bus", bus());
    map.insert("bicycle", bicycle());
    map.insert("foot", foot());
    map.insert("railway", railway());
    map.insert("tram", tram());
    map.insert("subway", subway());
    map
}
