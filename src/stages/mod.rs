pub mod stage0_window;
pub mod stage1_propose;
pub mod stage2_merge;
pub mod stage3_select;
pub mod stage4_tone;
pub mod stage5_render;

pub use stage0_window::*;
pub use stage1_propose::*;
pub use stage2_merge::*;
pub use stage3_select::*;
pub use stage4_tone::*;
pub use stage5_render::*;
