use super::catalog::CatalogError;
use super::curves::curve_manager::CurveError;
use super::fitter::fit::FitError;
use super::settings::SettingsError;
use std::error::Error;
use std::fmt::Display;

/// Bad input typed or picked in the controls. Reported to the user; nothing
/// is changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInputError {
    InvalidNumber { field: &'static str, text: String },
    NoModelSelected,
    NoCurveSelected,
}

impl Display for UserInputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserInputError::InvalidNumber { field, text } => {
                write!(f, "Invalid {field} value: '{text}'")
            }
            UserInputError::NoModelSelected => write!(f, "No fit model selected"),
            UserInputError::NoCurveSelected => write!(f, "No curve selected"),
        }
    }
}

impl Error for UserInputError {}

#[derive(Debug)]
pub enum VizError {
    Curve(CurveError),
    Fit(FitError),
    Catalog(CatalogError),
    Settings(SettingsError),
    UserInput(UserInputError),
}

impl From<CurveError> for VizError {
    fn from(err: CurveError) -> VizError {
        VizError::Curve(err)
    }
}

impl From<FitError> for VizError {
    fn from(err: FitError) -> VizError {
        VizError::Fit(err)
    }
}

impl From<CatalogError> for VizError {
    fn from(err: CatalogError) -> VizError {
        VizError::Catalog(err)
    }
}

impl From<SettingsError> for VizError {
    fn from(err: SettingsError) -> VizError {
        VizError::Settings(err)
    }
}

impl From<UserInputError> for VizError {
    fn from(err: UserInputError) -> Self {
        VizError::UserInput(err)
    }
}

impl Display for VizError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VizError::Curve(x) => write!(f, "{x}"),
            VizError::Fit(x) => write!(f, "{x}"),
            VizError::Catalog(x) => write!(f, "{x}"),
            VizError::Settings(x) => write!(f, "Settings error: {x}"),
            VizError::UserInput(x) => write!(f, "{x}"),
        }
    }
}

impl Error for VizError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            VizError::Curve(x) => Some(x),
            VizError::Fit(x) => Some(x),
            VizError::Catalog(x) => Some(x),
            VizError::Settings(x) => Some(x),
            VizError::UserInput(x) => Some(x),
        }
    }
}
