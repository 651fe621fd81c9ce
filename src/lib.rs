//! KexCore: Knowledge Exploration Graph Engine
//!
//! A Rust/WASM core for a branching question/answer canvas: nodes hold a
//! conversation, highlighted spans of an answer fork child nodes, and the
//! highlights survive re-renders because they are stored as offsets into
//! the answer's plain text rather than as DOM state.
//!
//! # Architecture
//!
//! ## Highlight Components
//! - `highlight/tree.rs` - Serde mirror of the rendered Markdown tree
//! - `highlight/walk.rs` - Shared allowed-text walk (the one coordinate system)
//! - `highlight/offsets.rs` - Selection endpoints -> allowed-text offsets
//! - `highlight/ranges.rs` - Range normalization, scoping, UTF-16 spans
//! - `highlight/injector.rs` - Staged `<mark>` splicing into a rendered tree
//!
//! ## Graph Components
//! - `graph/model.rs` - Nodes, edges, handles, qa history (wire-compatible JSON)
//! - `graph/registry.rs` - Child-id allocation over explicit adjacency
//! - `graph/label.rs` - Label assembly + measured rendered prefixes
//! - `graph/mutation.rs` - GraphEngine: forks, questions, answers, selection
//! - `graph/io.rs` - Versioned export/import with handle reconstruction
//!
//! ## Session Components
//! - `selection/controller.rs` - Selection toolbox state machine
//! - `session.rs` - Ask-request wire types, autosave debounce, load tokens
//! - `wasm.rs` - GraphCortex: the single stateful WASM handle
//!
//! # Usage (WASM)
//! ```javascript,ignore
//! import init, { GraphCortex } from 'kexcore';
//!
//! await init();
//!
//! const cortex = new GraphCortex(42, '## Question: seed\n');
//!
//! // selection -> highlight -> branch
//! const span = cortex.computeOffsets(tree, range, 'answer');
//! cortex.pointerUp({ nodeId: 'root', text, span, scope, rect });
//! const committed = cortex.confirmSelection();
//! const fork = cortex.forkQuestion({
//!   parentId: 'root',
//!   question: 'why is that?',
//!   asBranch: true,
//!   referenceContext: committed.contextText,
//! });
//! const answer = await post('/ask', fork.request);
//! cortex.applyAnswer(fork.nodeId, answer);
//! ```

pub mod graph;
pub mod highlight;
pub mod selection;
pub mod session;
pub mod wasm;

mod log;

pub use graph::*;
pub use highlight::*;
pub use selection::*;
pub use session::*;
pub use wasm::GraphCortex;

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
