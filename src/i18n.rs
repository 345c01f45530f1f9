//! Message catalog for envelopes and validation failures.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::users::validation::{Field, Rule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "es" => Ok(Locale::Es),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

/// Fixed envelope texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text {
    UsersListed,
    UserFetched,
    UserCreated,
    UserUpdated,
    UserDeleted,
    ListFailed,
    FetchFailed,
    CreateFailed,
    UpdateFailed,
    DeleteFailed,
    NotFound,
    ValidationFailed,
    ValidationHelp,
    MalformedBody,
    Healthy,
    ConnectionFailed,
}

impl Locale {
    pub fn text(self, text: Text) -> &'static str {
        match self {
            Locale::En => match text {
                Text::UsersListed => "Users retrieved successfully.",
                Text::UserFetched => "User retrieved successfully.",
                Text::UserCreated => "User created successfully.",
                Text::UserUpdated => "User updated successfully.",
                Text::UserDeleted => "User deleted successfully.",
                Text::ListFailed => "Error retrieving users.",
                Text::FetchFailed => "Error retrieving the user.",
                Text::CreateFailed => "Error creating the user.",
                Text::UpdateFailed => "Error updating the user.",
                Text::DeleteFailed => "Error deleting the user.",
                Text::NotFound => "User not found.",
                Text::ValidationFailed => {
                    "The form contains errors. Please correct them before continuing."
                }
                Text::ValidationHelp => {
                    "Review the indicated fields and check that the data meets the requirements."
                }
                Text::MalformedBody => "The request body is not valid JSON for this operation.",
                Text::Healthy => "API is up and running.",
                Text::ConnectionFailed => "Connection error. Check your internet connection.",
            },
            Locale::Es => match text {
                Text::UsersListed => "Usuarios obtenidos correctamente.",
                Text::UserFetched => "Usuario obtenido correctamente.",
                Text::UserCreated => "Usuario creado exitosamente.",
                Text::UserUpdated => "Usuario actualizado exitosamente.",
                Text::UserDeleted => "Usuario eliminado exitosamente.",
                Text::ListFailed => "Error al obtener los usuarios.",
                Text::FetchFailed => "Error al obtener el usuario.",
                Text::CreateFailed => "Error al crear el usuario.",
                Text::UpdateFailed => "Error al actualizar el usuario.",
                Text::DeleteFailed => "Error al eliminar el usuario.",
                Text::NotFound => "Usuario no encontrado.",
                Text::ValidationFailed => {
                    "Se encontraron errores en el formulario. Por favor corríjalos antes de continuar."
                }
                Text::ValidationHelp => {
                    "Revise los campos indicados y verifique que los datos cumplen con los requisitos."
                }
                Text::MalformedBody => "El cuerpo de la petición no es un JSON válido para esta operación.",
                Text::Healthy => "API funcionando correctamente.",
                Text::ConnectionFailed => "Error de conexión. Verifica tu conexión a internet.",
            },
        }
    }

    /// Renders the message reported for `field` failing `rule`.
    pub fn rule_message(self, field: Field, rule: Rule) -> String {
        match self {
            Locale::En => english(field, rule),
            Locale::Es => spanish(field, rule),
        }
    }
}

fn english(field: Field, rule: Rule) -> String {
    let label = match field {
        Field::FirstName => "first name",
        Field::LastName => "last name",
        Field::Email => "email",
        Field::Phone => "phone",
        Field::Status => "status",
    };
    match rule {
        Rule::Required => format!("The {label} is required."),
        Rule::MaxChars(max) => format!("The {label} may not be greater than {max} characters."),
        Rule::MinChars(min) => format!("The {label} must be at least {min} characters."),
        Rule::LettersAndSpaces => format!("The {label} may only contain letters and spaces."),
        Rule::EmailFormat => format!("The {label} must be a valid email address."),
        Rule::EmailDomain => format!("The {label} domain could not be resolved."),
        Rule::EmailTaken => "This email is already registered.".to_string(),
        Rule::PhoneChars => format!(
            "The {label} may only contain digits, spaces and the characters + - ( )."
        ),
        Rule::StatusValue => format!("The {label} must be either active or inactive."),
    }
}

fn spanish(field: Field, rule: Rule) -> String {
    match (field, rule) {
        (Field::FirstName, Rule::Required) => "El nombre es obligatorio".into(),
        (Field::FirstName, Rule::LettersAndSpaces) => {
            "El nombre solo puede contener letras y espacios".into()
        }
        (Field::LastName, Rule::Required) => "Los apellidos son obligatorios".into(),
        (Field::LastName, Rule::LettersAndSpaces) => {
            "Los apellidos solo pueden contener letras y espacios".into()
        }
        (Field::Email, Rule::Required) => "El correo electrónico es obligatorio".into(),
        (Field::Email, Rule::EmailFormat) => {
            "El correo electrónico debe tener un formato válido".into()
        }
        (Field::Email, Rule::EmailDomain) => {
            "El dominio del correo electrónico no pudo ser resuelto".into()
        }
        (Field::Email, Rule::EmailTaken) => "Este correo electrónico ya está registrado".into(),
        (Field::Phone, Rule::Required) => "El teléfono es obligatorio".into(),
        (Field::Phone, Rule::PhoneChars) => {
            "El teléfono solo puede contener números, espacios y los caracteres + - ( )".into()
        }
        (Field::Status, _) => "El estado debe ser active o inactive".into(),
        (field, Rule::MaxChars(max)) => {
            format!("El campo {} no debe superar {max} caracteres", spanish_label(field))
        }
        (field, Rule::MinChars(min)) => {
            format!("El campo {} debe tener al menos {min} caracteres", spanish_label(field))
        }
        (field, _) => format!("El campo {} no es válido", spanish_label(field)),
    }
}

fn spanish_label(field: Field) -> &'static str {
    match field {
        Field::FirstName => "nombre",
        Field::LastName => "apellidos",
        Field::Email => "correo electrónico",
        Field::Phone => "teléfono",
        Field::Status => "estado",
    }
}
