use serde_json::Value;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    En,
    De,
}

impl Lang {
    pub fn from_code(code: &str) -> Self {
        match code.to_ascii_lowercase().as_str() {
            "de" => Self::De,
            _ => Self::En,
        }
    }
}

fn load_message_file(lang: Lang, namespace: &str) -> Value {
    let lang_folder = match lang {
        Lang::En => "en",
        Lang::De => "de",
    };

    let file_path = Path::new("locales")
        .join(lang_folder)
        .join(format!("{namespace}.json"));

    match fs::read_to_string(&file_path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(json) => json,
            Err(err) => {
                log::error!("failed to parse JSON from {:?}: {}", file_path, err);
                Value::Null
            }
        },
        Err(err) => {
            log::error!("failed to read file {:?}: {}", file_path, err);
            Value::Null
        }
    }
}

#[derive(Debug, Clone)]
pub enum Namespace {
    Membership,
    Validation,
}

impl Namespace {
    fn as_str(&self) -> &'static str {
        match self {
            Namespace::Membership => "membership",
            Namespace::Validation => "validation",
        }
    }
}

#[derive(Debug)]
pub struct Messages {
    pub membership: Value,
    pub validation: Value,
}

impl Messages {
    pub fn new(lang: Lang) -> Self {
        Self {
            membership: load_message_file(lang, "membership"),
            validation: load_message_file(lang, "validation"),
        }
    }

    pub fn get(&self, namespace: &Namespace, path: &str) -> Option<&Value> {
        let root = match namespace {
            Namespace::Membership => &self.membership,
            Namespace::Validation => &self.validation,
        };

        let mut current = root;
        for key in path.split('.') {
            match current.get(key) {
                Some(next) => {
                    current = next;
                }
                None => {
                    log::debug!(
                        "key '{}' not found in path '{}.{}'",
                        key,
                        namespace.as_str(),
                        path
                    );
                    return None;
                }
            }
        }

        Some(current)
    }

    pub fn get_str(&self, namespace: Namespace, path: &str, fallback: &str) -> String {
        self.get(&namespace, path)
            .and_then(Value::as_str)
            .unwrap_or(fallback)
            .to_string()
    }

    pub fn get_validation_message(&self, path: &str, fallback: &str) -> String {
        self.get_str(Namespace::Validation, path, fallback)
    }
}

pub fn get_lang(req: &actix_web::HttpRequest) -> Lang {
    req.headers()
        .get("Accept-Language")
        .and_then(|value| value.to_str().ok())
        .and_then(|header| {
            header
                .split(',')
                .next()
                .and_then(|tag| tag.split('-').next())
        })
        .map(Lang::from_code)
        .unwrap_or(Lang::En)
}
