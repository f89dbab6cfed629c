pub mod geom;
pub mod hit;
pub mod paint;
pub mod raster;
pub mod surface;

pub use paint::ScenePainter;
pub use raster::RasterError;
pub use surface::{
    BackgroundLayer, CanvasTheme, Geometry, Handle, Origin, Primitive, PrimitiveShadow,
    RecordingSurface, RetainedSurface, SurfaceAdapter, SurfaceScene,
};
