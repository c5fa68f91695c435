//! Generation provider clients for the SaiAd pipeline.
//!
//! Each external capability (script, speech, music, video generation) is
//! modeled as a trait so the orchestrator stays decoupled from vendor
//! choice. Concrete clients map network and API failures into the shared
//! [`ProviderError`] taxonomy; errors never panic past the client boundary.

pub mod error;
pub mod music;
pub mod script;
pub mod speech;
pub mod traits;
pub mod video;

pub use error::{ProviderError, ProviderResult};
pub use music::{MusicMood, StockMusicLibrary, SunoMusicClient};
pub use script::AnthropicScriptClient;
pub use speech::{ElevenLabsSpeechClient, Voice};
pub use video::RunwayVideoClient;
pub use traits::{
    MusicSelector, MusicTrack, ScriptGenerator, SpeechAudio, SpeechSynthesizer, VideoGenerator,
    VideoTask, VideoTaskStatus,
};
