//! Built-in node kinds the core ships with. See `SPEC_FULL.md` §A for why
//! this set is minimal: `root`/`tap_in`/`tap_out` are part of the contract
//! itself (§4.5/§4.6), `const`/`multiply` exist only so the engine is
//! exercisable end to end without a DSP node library.

mod constant;
mod multiply;
mod root;
mod tap;

pub use constant::ConstNode;
pub use multiply::MultiplyNode;
pub use root::RootNode;
pub use tap::{TapInNode, TapOutNode};

use crate::node::NodeFactory;

/// `(type_name, factory)` pairs for every built-in kind, for
/// `Runtime::new` to register up front.
#[must_use]
pub fn builtin_factories() -> Vec<(&'static str, NodeFactory)> {
    vec![
        ("root", RootNode::construct),
        ("tap_in", TapInNode::construct),
        ("tap_out", TapOutNode::construct),
        ("const", ConstNode::construct),
        ("multiply", MultiplyNode::construct),
    ]
}
