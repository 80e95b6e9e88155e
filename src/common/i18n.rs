// src/common/i18n.rs

use std::collections::HashMap;

// Catálogos embutidos no binário. Chave -> mensagem.
const CATALOGS: &[(&str, &str)] = &[
    ("en", include_str!("../../locales/en.json")),
    ("pt", include_str!("../../locales/pt.json")),
];

pub const DEFAULT_LANG: &str = "en";

#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn load() -> Result<Self, serde_json::Error> {
        let mut catalogs = HashMap::new();
        for (lang, raw) in CATALOGS {
            let messages: HashMap<String, String> = serde_json::from_str(raw)?;
            catalogs.insert((*lang).to_string(), messages);
        }
        Ok(Self { catalogs })
    }

    /// Traduz a chave. Idioma desconhecido cai no inglês; chave desconhecida volta como está.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.catalogs
            .get(lang)
            .and_then(|messages| messages.get(key))
            .or_else(|| self.catalogs.get(DEFAULT_LANG).and_then(|messages| messages.get(key)))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_language_has_the_same_keys() {
        let store = I18nStore::load().unwrap();
        let en = &store.catalogs["en"];
        let pt = &store.catalogs["pt"];

        let mut missing: Vec<_> = en.keys().filter(|k| !pt.contains_key(*k)).collect();
        missing.extend(pt.keys().filter(|k| !en.contains_key(*k)));
        assert!(missing.is_empty(), "chaves faltando: {missing:?}");
    }

    #[test]
    fn falls_back_to_english_then_to_the_key() {
        let store = I18nStore::load().unwrap();

        assert_eq!(store.translate("fr", "errors.forbidden"), "You are not allowed to perform this action.");
        assert_eq!(store.translate("pt", "errors.nao_existe"), "errors.nao_existe");
    }
}
