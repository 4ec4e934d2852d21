// Renderer: pure document → visual tree, plus a plain-text printer for terminal preview.

pub mod renderer;
pub mod text;
pub mod tree;

pub use renderer::{render, render_tree};
pub use text::to_plain_text;
pub use tree::{
    Block, FieldItem, Heading, HeadingLevel, RenderedEntry, RenderedSection, RenderedTree,
    SectionKind,
};
