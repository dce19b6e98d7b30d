//! Association declarations and resolved descriptors.
//!
//! Models declare associations with [`belongs_to`] and [`has_many`]. At schema
//! build time each declaration is resolved against its owning model into an
//! immutable [`Association`] descriptor: owner, name, kind, target model and
//! foreign-key field. Records never copy descriptors; they look them up in
//! the schema by `(model, name)`.
//!
//! ```ignore
//! use mocklayer::association::{belongs_to, has_many};
//!
//! let schema = Schema::builder()
//!     .model("author", [has_many("posts")])
//!     .model("post", [belongs_to("author"), has_many("comments")])
//!     .model("comment", [belongs_to("post")])
//!     .build(InMemoryDb::new())?;
//! ```

use std::fmt;

use crate::inflector::singularize;

/// The kind of an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationKind {
    /// "Belongs to": the owner stores a foreign key to at most one target record.
    Singular,
    /// "Has many": target records store a foreign key back to the owner.
    Plural,
}

impl fmt::Display for AssociationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssociationKind::Singular => write!(f, "belongs_to"),
            AssociationKind::Plural => write!(f, "has_many"),
        }
    }
}

/// An unresolved association declaration, as written in a model definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationDef {
    name: String,
    kind: AssociationKind,
    model: Option<String>,
    foreign_key: Option<String>,
}

impl AssociationDef {
    fn new(name: impl Into<String>, kind: AssociationKind) -> Self {
        Self {
            name: name.into(),
            kind,
            model: None,
            foreign_key: None,
        }
    }

    /// Overrides the target model (defaults to the model whose name or table
    /// matches the association name).
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Overrides the foreign-key field.
    pub fn foreign_key(mut self, field: impl Into<String>) -> Self {
        self.foreign_key = Some(field.into());
        self
    }

    /// Returns the declared association name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolves this declaration against its owning model. `target_for`
    /// maps the association name to a model when no target was given.
    pub(crate) fn resolve(
        self,
        owner: &str,
        target_for: impl FnOnce(&str) -> String,
    ) -> Association {
        let target = self
            .model
            .unwrap_or_else(|| target_for(&self.name));
        let foreign_key = self.foreign_key.unwrap_or_else(|| match self.kind {
            AssociationKind::Singular => format!("{}_id", self.name),
            AssociationKind::Plural => format!("{owner}_id"),
        });

        Association {
            owner: owner.to_string(),
            name: self.name,
            kind: self.kind,
            target,
            foreign_key,
        }
    }
}

/// Declares a singular ("belongs to") association.
///
/// The foreign key `{name}_id` is stored on the declaring model.
pub fn belongs_to(name: impl Into<String>) -> AssociationDef {
    AssociationDef::new(name, AssociationKind::Singular)
}

/// Declares a plural ("has many") association.
///
/// The foreign key `{owner}_id` is stored on the target model's rows.
pub fn has_many(name: impl Into<String>) -> AssociationDef {
    AssociationDef::new(name, AssociationKind::Plural)
}

/// A resolved, immutable association descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    owner: String,
    name: String,
    kind: AssociationKind,
    target: String,
    foreign_key: String,
}

impl Association {
    /// The model declaring this association.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The association name, also the accessor name and embed key.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AssociationKind {
        self.kind
    }

    /// The model on the other end of the association.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The foreign-key field: on the owner for singular associations,
    /// on the target for plural ones.
    pub fn foreign_key(&self) -> &str {
        &self.foreign_key
    }

    pub fn is_singular(&self) -> bool {
        self.kind == AssociationKind::Singular
    }

    pub fn is_plural(&self) -> bool {
        self.kind == AssociationKind::Plural
    }

    /// The key under which a serialized owner exposes the related ids:
    /// the foreign key for singular associations, `{name}_ids` (singularized) for plural ones.
    pub fn ids_key(&self) -> String {
        match self.kind {
            AssociationKind::Singular => self.foreign_key.clone(),
            AssociationKind::Plural => format!("{}_ids", singularize(&self.name)),
        }
    }
}
