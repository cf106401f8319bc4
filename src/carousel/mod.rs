pub use context::Context;
pub use driver::{Carousel, PlaneInstance, TIME_STEP};
pub use input::InputCollector;
pub use layout::{InvalidViewport, PlaneFrame, PlaneSlot, Screen, Viewport};
pub use loader::{scan_images, LoadedImage, Loader};
pub use scroll::{Direction, Scroll, ScrollFrame, SCROLL_EASE};

mod context;
mod driver;
mod input;
mod layout;
mod loader;
mod scroll;
