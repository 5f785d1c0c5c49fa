use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Labsight";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the application data directory
/// ~/Labsight/ on all platforms (user-visible, holds models and diagnostics)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Labsight")
}

/// Get the models directory (pre-trained risk models)
pub fn models_dir() -> PathBuf {
    app_data_dir().join("models")
}

/// Default path of the diabetes risk model artifact.
pub fn diabetes_model_path() -> PathBuf {
    models_dir().join("diabetes.onnx")
}

/// Whether this is a development build.
pub fn is_dev() -> bool {
    cfg!(debug_assertions)
}

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    if is_dev() {
        "labsight=debug,info"
    } else {
        "labsight=info"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("Labsight"));
    }

    #[test]
    fn models_dir_under_app_data() {
        let models = models_dir();
        let app = app_data_dir();
        assert!(models.starts_with(app));
        assert!(models.ends_with("models"));
    }

    #[test]
    fn diabetes_model_is_onnx() {
        assert!(diabetes_model_path().ends_with("diabetes.onnx"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }
}
