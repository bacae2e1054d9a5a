mod settings;
pub use settings::build_tokenized_settings;
