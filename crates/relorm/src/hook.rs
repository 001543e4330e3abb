//! Lifecycle hooks.
//!
//! A write runs `BeforeChange`, then `BeforeCreate|BeforeUpdate|BeforeDelete`,
//! then the statement, then `After*`, then `AfterChange`. A read runs
//! `BeforeFind`, the query, relation resolution, then `AfterFind`.
//!
//! Every hook registered at a phase runs even when an earlier one fails; the
//! failures are collected into one [`OrmError::Hook`]. A failed before-phase
//! stops the statement from being sent. A failed after-phase is returned to
//! the caller but the write has already happened.

use std::fmt;
use std::str::FromStr;

use futures_core::future::BoxFuture;

use crate::context::Context;
use crate::db::Db;
use crate::error::{HookErrors, OrmError, OrmResult};

/// Named points in a record's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    BeforeChange,
    AfterChange,
    BeforeCreate,
    AfterCreate,
    BeforeUpdate,
    AfterUpdate,
    BeforeDelete,
    AfterDelete,
    BeforeFind,
    AfterFind,
}

impl HookPoint {
    pub const ALL: [HookPoint; 10] = [
        HookPoint::BeforeChange,
        HookPoint::AfterChange,
        HookPoint::BeforeCreate,
        HookPoint::AfterCreate,
        HookPoint::BeforeUpdate,
        HookPoint::AfterUpdate,
        HookPoint::BeforeDelete,
        HookPoint::AfterDelete,
        HookPoint::BeforeFind,
        HookPoint::AfterFind,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HookPoint::BeforeChange => "BeforeChange",
            HookPoint::AfterChange => "AfterChange",
            HookPoint::BeforeCreate => "BeforeCreate",
            HookPoint::AfterCreate => "AfterCreate",
            HookPoint::BeforeUpdate => "BeforeUpdate",
            HookPoint::AfterUpdate => "AfterUpdate",
            HookPoint::BeforeDelete => "BeforeDelete",
            HookPoint::AfterDelete => "AfterDelete",
            HookPoint::BeforeFind => "BeforeFind",
            HookPoint::AfterFind => "AfterFind",
        }
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HookPoint {
    type Err = OrmError;

    /// Accepts `BeforeCreate` as well as `before_create`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let squashed: String = s
            .chars()
            .filter(|c| *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        HookPoint::ALL
            .into_iter()
            .find(|p| p.name().to_ascii_lowercase() == squashed)
            .ok_or_else(|| OrmError::config(format!("unknown hook point `{s}`")))
    }
}

/// The supported hook call shapes.
pub enum Hook<R> {
    Plain(fn(&mut R)),
    Fallible(fn(&mut R) -> OrmResult<()>),
    WithDb(for<'a> fn(&'a mut R, &'a Db) -> BoxFuture<'a, ()>),
    WithDbFallible(for<'a> fn(&'a mut R, &'a Db) -> BoxFuture<'a, OrmResult<()>>),
    WithContext(fn(&mut R, &Context)),
    WithContextFallible(fn(&mut R, &Context) -> OrmResult<()>),
    WithContextDb(for<'a> fn(&'a mut R, &'a Context, &'a Db) -> BoxFuture<'a, ()>),
    WithContextDbFallible(
        for<'a> fn(&'a mut R, &'a Context, &'a Db) -> BoxFuture<'a, OrmResult<()>>,
    ),
}

impl<R> Clone for Hook<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Hook<R> {}

impl<R> fmt::Debug for Hook<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match self {
            Hook::Plain(_) => "Plain",
            Hook::Fallible(_) => "Fallible",
            Hook::WithDb(_) => "WithDb",
            Hook::WithDbFallible(_) => "WithDbFallible",
            Hook::WithContext(_) => "WithContext",
            Hook::WithContextFallible(_) => "WithContextFallible",
            Hook::WithContextDb(_) => "WithContextDb",
            Hook::WithContextDbFallible(_) => "WithContextDbFallible",
        };
        f.write_str(shape)
    }
}

impl<R: Send> Hook<R> {
    async fn call(&self, record: &mut R, db: &Db) -> OrmResult<()> {
        match *self {
            Hook::Plain(f) => {
                f(record);
                Ok(())
            }
            Hook::Fallible(f) => f(record),
            Hook::WithDb(f) => {
                f(record, db).await;
                Ok(())
            }
            Hook::WithDbFallible(f) => f(record, db).await,
            Hook::WithContext(f) => {
                f(record, db.context());
                Ok(())
            }
            Hook::WithContextFallible(f) => f(record, db.context()),
            Hook::WithContextDb(f) => {
                f(record, db.context(), db).await;
                Ok(())
            }
            Hook::WithContextDbFallible(f) => f(record, db.context(), db).await,
        }
    }
}

/// Hooks declared by a record type.
pub struct HookSet<R> {
    hooks: Vec<(HookPoint, Hook<R>)>,
}

impl<R> Default for HookSet<R> {
    fn default() -> Self {
        Self { hooks: Vec::new() }
    }
}

impl<R> fmt::Debug for HookSet<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.hooks.iter()).finish()
    }
}

impl<R: Send> HookSet<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hook at `point`. Hooks at the same point run in insertion order.
    pub fn on(mut self, point: HookPoint, hook: Hook<R>) -> Self {
        self.hooks.push((point, hook));
        self
    }

    /// Add a hook by point name. Unknown names are a configuration error.
    pub fn register(mut self, name: &str, hook: Hook<R>) -> OrmResult<Self> {
        let point = name.parse::<HookPoint>()?;
        self.hooks.push((point, hook));
        Ok(self)
    }

    pub fn has(&self, point: HookPoint) -> bool {
        self.hooks.iter().any(|(p, _)| *p == point)
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook at `point`, collecting failures.
    pub async fn dispatch(&self, point: HookPoint, record: &mut R, db: &Db) -> HookErrors {
        let mut errors = HookErrors::new();
        for (_, hook) in self.hooks.iter().filter(|(p, _)| *p == point) {
            if let Err(e) = hook.call(record, db).await {
                tracing::debug!(target: "relorm", hook = %point, error = %e, "hook failed");
                errors.push(e);
            }
        }
        errors
    }

    /// Run the points of one phase in order and fold their failures into a
    /// single result.
    pub async fn run_phase(&self, points: &[HookPoint], record: &mut R, db: &Db) -> OrmResult<()> {
        let mut errors = HookErrors::new();
        for point in points {
            errors.extend(self.dispatch(*point, record, db).await);
        }
        errors.into_result()
    }
}

/// Phase tables for the write and read paths.
pub(crate) mod phase {
    use super::HookPoint::*;
    use super::HookPoint;

    pub const BEFORE_CREATE: &[HookPoint] = &[BeforeChange, BeforeCreate];
    pub const AFTER_CREATE: &[HookPoint] = &[AfterCreate, AfterChange];
    pub const BEFORE_UPDATE: &[HookPoint] = &[BeforeChange, BeforeUpdate];
    pub const AFTER_UPDATE: &[HookPoint] = &[AfterUpdate, AfterChange];
    pub const BEFORE_DELETE: &[HookPoint] = &[BeforeChange, BeforeDelete];
    pub const AFTER_DELETE: &[HookPoint] = &[AfterDelete, AfterChange];
    pub const BEFORE_FIND: &[HookPoint] = &[BeforeFind];
    pub const AFTER_FIND: &[HookPoint] = &[AfterFind];
}
