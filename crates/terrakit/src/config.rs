//! String-keyed configuration tree.
//!
//! A [`Config`] node has a key, an optional string value and an ordered list
//! of children. Typed access goes through [`FromStr`] and [`ToString`], and the
//! whole tree round-trips through JSON.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use terrakit_geo::{GeoExtent, Profile, Srs};

use crate::error::{Error, Result};

/// One node of a configuration tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<Config>,
}

impl Config {
    /// An empty node named `key`.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// A leaf node holding `value`.
    #[must_use]
    pub fn with_value(key: impl Into<String>, value: impl ToString) -> Self {
        Self {
            key: key.into(),
            value: Some(value.to_string()),
            children: Vec::new(),
        }
    }

    /// Name of this node.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// This node's own value.
    #[must_use]
    pub fn own_value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// True when the node carries neither a value nor children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.children.is_empty()
    }

    /// Child nodes in insertion order.
    #[must_use]
    pub fn children(&self) -> &[Config] {
        &self.children
    }

    pub fn children_named<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Config> + 'a {
        self.children.iter().filter(move |c| c.key == key)
    }

    /// First child named `key`.
    #[must_use]
    pub fn child(&self, key: &str) -> Option<&Config> {
        self.children.iter().find(|c| c.key == key)
    }

    /// Whether a child named `key` exists.
    #[must_use]
    pub fn has_child(&self, key: &str) -> bool {
        self.child(key).is_some()
    }

    /// Whether a child named `key` carries a value.
    #[must_use]
    pub fn has_value(&self, key: &str) -> bool {
        self.value(key).is_some()
    }

    /// Value of the first child named `key`.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&str> {
        self.child(key).and_then(Config::own_value)
    }

    /// Parse the value of child `key`. Missing or malformed values give `None`.
    #[must_use]
    pub fn get<T: FromStr>(&self, key: &str) -> Option<T> {
        self.value(key).and_then(|v| v.trim().parse().ok())
    }

    /// Replace any children named `key` with a single leaf holding `value`.
    pub fn set(&mut self, key: &str, value: impl ToString) {
        self.remove(key);
        self.children.push(Config::with_value(key, value));
    }

    /// Like [`Config::set`], but removes `key` when `value` is `None`.
    pub fn set_opt<T: ToString>(&mut self, key: &str, value: Option<T>) {
        match value {
            Some(value) => self.set(key, value),
            None => self.remove(key),
        }
    }

    /// Replace any children named `key` with `child`, renamed to `key`.
    pub fn set_child(&mut self, key: &str, mut child: Config) {
        self.remove(key);
        child.key = key.to_string();
        self.children.push(child);
    }

    /// Append `child` under `key`, keeping existing children of that name.
    pub fn add(&mut self, key: &str, mut child: Config) {
        child.key = key.to_string();
        self.children.push(child);
    }

    /// Remove every child named `key`.
    pub fn remove(&mut self, key: &str) {
        self.children.retain(|c| c.key != key);
    }

    /// Pretty-printed JSON form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse the form written by [`Config::to_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Describe a profile as a config subtree.
///
/// Well-known profiles are written by name; anything else spells out its SRS,
/// extent and root tile layout.
#[must_use]
pub fn profile_to_config(profile: &Profile) -> Config {
    let mut conf = Config::new("profile");
    if let Some(name) = profile.well_known_name() {
        conf.set("name", name);
        return conf;
    }
    let extent = profile.extent();
    let (wide, high) = profile.root_tiles();
    conf.set("srs", extent.srs().definition());
    conf.set("xmin", extent.x_min());
    conf.set("ymin", extent.y_min());
    conf.set("xmax", extent.x_max());
    conf.set("ymax", extent.y_max());
    conf.set("tiles_wide", wide);
    conf.set("tiles_high", high);
    conf
}

/// Read a profile written by [`profile_to_config`].
pub fn profile_from_config(conf: &Config) -> Result<Profile> {
    if let Some(name) = conf.value("name") {
        return Ok(Profile::from_name(name)?);
    }
    let srs: Srs = conf
        .value("srs")
        .ok_or_else(|| Error::Config {
            key: "profile".into(),
            detail: "needs a name or an srs".into(),
        })?
        .parse()?;
    let coord = |key: &str| {
        conf.get::<f64>(key).ok_or_else(|| Error::Config {
            key: format!("profile.{key}"),
            detail: "missing or not a number".into(),
        })
    };
    let extent = GeoExtent::new(srs, coord("xmin")?, coord("ymin")?, coord("xmax")?, coord("ymax")?)?;
    Ok(Profile::new(
        extent,
        conf.get("tiles_wide").unwrap_or(1),
        conf.get("tiles_high").unwrap_or(1),
    )?)
}
