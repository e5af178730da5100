mod winit;

pub use winit::WinitTranslator;
