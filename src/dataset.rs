use log::warn;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{KappaError, KappaResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Field {
    Matrix(DMatrix<f64>),
    Vector(DVector<f64>),
}

impl Field {
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Field::Matrix(m) => m.shape(),
            Field::Vector(v) => v.shape(),
        }
    }
}

impl From<DMatrix<f64>> for Field {
    fn from(m: DMatrix<f64>) -> Self {
        Field::Matrix(m)
    }
}

impl From<DVector<f64>> for Field {
    fn from(v: DVector<f64>) -> Self {
        Field::Vector(v)
    }
}

/// Batch of new fields produced by one analysis stage.
#[derive(Debug, Default)]
pub struct Fields(Vec<(String, Field)>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &str, field: impl Into<Field>) {
        self.0.push((key.to_string(), field.into()));
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Extend<(String, Field)> for Fields {
    fn extend<I: IntoIterator<Item = (String, Field)>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for Fields {
    type Item = (String, Field);
    type IntoIter = std::vec::IntoIter<(String, Field)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Named numeric arrays of one analysis session, ordered by key.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    fields: BTreeMap<String, Field>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, field: impl Into<Field>) -> Option<Field> {
        self.fields.insert(key.to_string(), field.into())
    }

    pub fn merge(&mut self, fields: Fields) {
        for (key, field) in fields {
            if self.fields.insert(key.clone(), field).is_some() {
                warn!("overwriting existing field '{key}'");
            }
        }
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Field> {
        self.fields.get(key)
    }

    pub fn matrix(&self, key: &str) -> Option<&DMatrix<f64>> {
        match self.fields.get(key) {
            Some(Field::Matrix(m)) => Some(m),
            _ => None,
        }
    }

    pub fn vector(&self, key: &str) -> Option<&DVector<f64>> {
        match self.fields.get(key) {
            Some(Field::Vector(v)) => Some(v),
            _ => None,
        }
    }

    pub fn require_matrix(&self, key: &str, context: &str) -> KappaResult<&DMatrix<f64>> {
        self.matrix(key)
            .ok_or_else(|| KappaError::missing(key, context))
    }

    pub fn require_vector(&self, key: &str, context: &str) -> KappaResult<&DVector<f64>> {
        self.vector(key)
            .ok_or_else(|| KappaError::missing(key, context))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn save(&self, path: &Path) -> KappaResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load(path: &Path) -> KappaResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(bincode::deserialize_from(reader)?)
    }
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.fields.iter().map(|(k, v)| (k, v.shape())))
            .finish()
    }
}
