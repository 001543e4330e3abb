//! Relation resolution (eager loading of related records).
//!
//! A relation links `owner.local` to `target.foreign`. After a read, every
//! relation of the owner type is resolved with one extra query:
//! - a single owner filters `foreign = ?`;
//! - a batch of owners collects the distinct local keys and filters
//!   `foreign IN (?)`, then hands each owner the rows matching its key.
//!
//! Related records are loaded flat; their own relations are not resolved.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::builder::FilterSpec;
use crate::db::Db;
use crate::error::{OrmError, OrmResult};
use crate::record::Record;
use crate::value::{Value, ValueKey};

/// Callback that narrows a relation's secondary query.
pub type RelationChain = Arc<dyn Fn(&mut FilterSpec) + Send + Sync>;

/// Relation callbacks keyed by relation field name.
pub type RelationChains = HashMap<String, RelationChain>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

/// Parsed relation metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDescriptor {
    pub field: &'static str,
    pub local: String,
    pub foreign: String,
    pub cardinality: Cardinality,
    pub connection: Option<String>,
}

impl RelationDescriptor {
    /// Parse a `"local,foreign"` tag. Anything but exactly two non-empty
    /// names is a configuration error.
    pub fn parse(
        field: &'static str,
        tag: &str,
        cardinality: Cardinality,
        connection: Option<&str>,
    ) -> OrmResult<Self> {
        let parts: Vec<&str> = tag.split(',').map(str::trim).collect();
        match parts.as_slice() {
            [local, foreign] if !local.is_empty() && !foreign.is_empty() => Ok(Self {
                field,
                local: local.to_string(),
                foreign: foreign.to_string(),
                cardinality,
                connection: connection.map(str::to_string),
            }),
            _ => Err(OrmError::config(format!(
                "relation `{field}` must be declared as \"local,foreign\", got \"{tag}\""
            ))),
        }
    }
}

/// A relation field declared on `R`.
pub struct Relation<R> {
    field: &'static str,
    tag: &'static str,
    cardinality: Cardinality,
    connection: Option<&'static str>,
    loader: Box<dyn RelationLoader<R>>,
}

impl<R> fmt::Debug for Relation<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("field", &self.field)
            .field("tag", &self.tag)
            .field("cardinality", &self.cardinality)
            .field("connection", &self.connection)
            .finish()
    }
}

impl<R: Record> Relation<R> {
    /// One-to-one: `slot` points at an `Option<T>` field.
    pub fn one<T: Record>(
        field: &'static str,
        tag: &'static str,
        slot: fn(&mut R) -> &mut Option<T>,
    ) -> Self {
        Self {
            field,
            tag,
            cardinality: Cardinality::One,
            connection: None,
            loader: Box::new(HasOne { slot }),
        }
    }

    /// One-to-many: `slot` points at a `Vec<T>` field.
    pub fn many<T: Record>(
        field: &'static str,
        tag: &'static str,
        slot: fn(&mut R) -> &mut Vec<T>,
    ) -> Self {
        Self {
            field,
            tag,
            cardinality: Cardinality::Many,
            connection: None,
            loader: Box::new(HasMany { slot }),
        }
    }

    /// Route the secondary query to a named connection.
    pub fn connection(mut self, name: &'static str) -> Self {
        self.connection = Some(name);
        self
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn descriptor(&self) -> OrmResult<RelationDescriptor> {
        RelationDescriptor::parse(self.field, self.tag, self.cardinality, self.connection)
    }
}

#[async_trait]
trait RelationLoader<R>: Send + Sync {
    async fn load(
        &self,
        desc: &RelationDescriptor,
        db: &Db,
        owners: &mut [R],
        chain: Option<&RelationChain>,
    ) -> OrmResult<()>;
}

struct HasOne<R, T> {
    slot: fn(&mut R) -> &mut Option<T>,
}

struct HasMany<R, T> {
    slot: fn(&mut R) -> &mut Vec<T>,
}

/// Fetch the targets of one relation for `owners`, grouped by foreign key.
async fn fetch_grouped<R: Record, T: Record>(
    desc: &RelationDescriptor,
    db: &Db,
    owners: &[R],
    chain: Option<&RelationChain>,
) -> OrmResult<Option<HashMap<ValueKey, Vec<T>>>> {
    let local = R::field(&desc.local).ok_or_else(|| {
        OrmError::config(format!(
            "relation `{}`: {} has no column `{}`",
            desc.field,
            R::table_name(),
            desc.local
        ))
    })?;
    let foreign = T::field(&desc.foreign).ok_or_else(|| {
        OrmError::config(format!(
            "relation `{}`: {} has no column `{}`",
            desc.field,
            T::table_name(),
            desc.foreign
        ))
    })?;

    let mut seen = HashSet::new();
    let mut keys: Vec<Value> = Vec::new();
    for owner in owners {
        let value = (local.get)(owner);
        if let Some(key) = value.key()
            && seen.insert(key)
        {
            keys.push(value);
        }
    }
    if keys.is_empty() {
        return Ok(None);
    }

    let column = db.dialect().quote(&desc.foreign);
    let mut filter = FilterSpec::new();
    if keys.len() == 1 {
        filter.and_where(&format!("{column}=?"), keys);
    } else {
        filter.and_where(&format!("{column} IN (?)"), [Value::List(keys)]);
    }
    if let Some(chain) = chain {
        chain(&mut filter);
    }

    let children: Vec<T> = db.fetch_records(T::table_name(), &filter).await?;

    let mut grouped: HashMap<ValueKey, Vec<T>> = HashMap::new();
    for child in children {
        if let Some(key) = (foreign.get)(&child).key() {
            grouped.entry(key).or_default().push(child);
        }
    }
    Ok(Some(grouped))
}

fn owner_key<R: Record>(desc: &RelationDescriptor, owner: &R) -> Option<ValueKey> {
    R::field(&desc.local).and_then(|f| (f.get)(owner).key())
}

#[async_trait]
impl<R: Record, T: Record> RelationLoader<R> for HasOne<R, T> {
    async fn load(
        &self,
        desc: &RelationDescriptor,
        db: &Db,
        owners: &mut [R],
        chain: Option<&RelationChain>,
    ) -> OrmResult<()> {
        let grouped = fetch_grouped::<R, T>(desc, db, owners, chain)
            .await?
            .unwrap_or_default();
        for owner in owners.iter_mut() {
            let found = owner_key(desc, owner)
                .and_then(|k| grouped.get(&k))
                .and_then(|children| children.first().cloned());
            *(self.slot)(owner) = found;
        }
        Ok(())
    }
}

#[async_trait]
impl<R: Record, T: Record> RelationLoader<R> for HasMany<R, T> {
    async fn load(
        &self,
        desc: &RelationDescriptor,
        db: &Db,
        owners: &mut [R],
        chain: Option<&RelationChain>,
    ) -> OrmResult<()> {
        let grouped = fetch_grouped::<R, T>(desc, db, owners, chain)
            .await?
            .unwrap_or_default();
        for owner in owners.iter_mut() {
            let children = owner_key(desc, owner)
                .and_then(|k| grouped.get(&k))
                .cloned()
                .unwrap_or_default();
            *(self.slot)(owner) = children;
        }
        Ok(())
    }
}

/// Resolve every relation of a single record.
pub async fn resolve_one<R: Record>(
    db: &Db,
    record: &mut R,
    chains: &RelationChains,
) -> OrmResult<()> {
    resolve_many(db, std::slice::from_mut(record), chains).await
}

/// Resolve every relation of a batch of records with one query per relation.
pub async fn resolve_many<R: Record>(
    db: &Db,
    records: &mut [R],
    chains: &RelationChains,
) -> OrmResult<()> {
    let relations = R::relations();
    if relations.is_empty() || records.is_empty() {
        return Ok(());
    }
    for relation in &relations {
        let desc = relation.descriptor()?;
        let target = db.route(desc.connection.as_deref())?;
        let chain = chains.get(desc.field);
        relation.loader.load(&desc, &target, records, chain).await?;
    }
    Ok(())
}
