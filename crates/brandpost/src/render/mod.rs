pub mod brand;
pub mod compose;
pub mod layout;

pub use brand::BrandKit;
pub use compose::{Compositor, PostComposer, CANVAS_SIZE};
pub use layout::{fit_block, line_height, phrase_spans, wrap_text, FittedBlock, TextMeasure};
