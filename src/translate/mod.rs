pub mod interface;

pub use interface::{
    InstalledLanguage, LanguageDetector, ModelPackage, TranslationEngine, TranslationRequest,
    TranslationResponse, Translator,
};
