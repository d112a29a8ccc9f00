//! fOS Shadow - logical and composed views of one tree
//!
//! A [`ShadowDom`] wraps every physical node of a [`DomTree`] in exactly one
//! wrapper and lets the wrapper's parent/child/sibling edges diverge from
//! the physical ones. Content authored under a shadow host stays put in the
//! *logical* tree while the physical tree is rewritten into the *composed*
//! shape, with host children distributed into `<content>` insertion points.
//!
//! # Layers
//! - [`SideTable`]: association keyed by generational [`NodeId`]; an entry
//!   dies with its physical node.
//! - [`Relatives`]: the per-wrapper overlay of five navigation edges, each
//!   [`Edge::Deferred`] (ask the physical tree), [`Edge::Node`] or
//!   [`Edge::None`]. Allocated on the first write, never on reads.
//! - Mutation engine: `append_child`, `insert_before`, `remove_child`,
//!   `replace_child`, `clone_node`, `set_text_content`. Each call picks a
//!   cheap pass-through path or the overlay path depending on whether the
//!   nodes involved take part in a shadow composition.
//! - Render scheduler: mutations only mark hosts stale; reads of derived
//!   state such as [`ShadowDom::get_distributed_nodes`] flush them through
//!   the installed [`Distributor`].
//!
//! # Example
//! ```rust,ignore
//! use fos_shadow::{Config, ShadowDom};
//!
//! let mut dom = ShadowDom::new(Config::default());
//! let doc = dom.document();
//! let host = dom.create_element(doc, "div")?;
//! let root = dom.attach_shadow_root(host)?;
//! dom.set_inner_html(root, "<b>before</b><content></content>")?;
//! ```

mod adopt;
mod config;
mod distribution;
mod dom;
mod ext_data;
mod mutation;
mod relatives;
mod render;
mod shadow_root;
mod side_table;
mod wrapper;

pub use config::Config;
pub use distribution::ContentDistributor;
pub use dom::ShadowDom;
pub use ext_data::{ExtData, HostRenderer};
pub use relatives::{Edge, Relation, Relatives};
pub use render::Distributor;
pub use shadow_root::HitTester;
pub use side_table::SideTable;
pub use wrapper::WrapperKind;

pub use fos_dom::{DocumentPosition, DomError, DomTree, MutationRecord, MutationType, NodeId};

/// Handle to a wrapper node
///
/// Arena slots are reused after a wrapper is released; the slot generation
/// keeps an old handle from resolving to the next occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WrapperId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

/// Result type for overlay operations
pub type ShadowResult<T> = Result<T, ShadowError>;

/// Overlay operation errors
///
/// All of these are contract violations raised before any state changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShadowError {
    /// Reference or old child is not a logical child of the given parent
    #[error("NotFoundError: node is not a child of this parent")]
    NotFound,
    /// Argument has no live wrapper identity
    #[error("Argument is not a wrapped node")]
    NotANode,
    /// Identifier can never match an element id
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),
    /// Physical node already has a wrapper
    #[error("Physical node is already associated with a wrapper")]
    DuplicateAssociation,
    /// Insertion would make a node its own ancestor, or target cannot hold children
    #[error("Hierarchy request error")]
    HierarchyRequest,
    /// Error from the physical tree
    #[error(transparent)]
    Dom(#[from] DomError),
}
