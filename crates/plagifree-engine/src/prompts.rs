//! Mode and tone directives for the rewriting engine.
//!
//! The table is declarative: a TOML document compiled into the crate, with
//! an optional file on disk overriding individual entries. It is loaded once
//! at startup and every mode and tone must resolve to a directive.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;

use figment::{
    Figment,
    providers::{Format, Toml},
};
use plagifree_core::{PlagiError, PlagiResult, RewriteMode, RewriteTone};
use serde::Deserialize;

const BUILTIN: &str = include_str!("instructions.toml");

#[derive(Debug, Deserialize)]
struct RawTable {
    preamble: String,
    rules: Vec<String>,
    closing: String,
    modes: BTreeMap<String, String>,
    tones: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct InstructionTable {
    preamble: String,
    rules: Vec<String>,
    closing: String,
    modes: HashMap<RewriteMode, String>,
    tones: HashMap<RewriteTone, String>,
}

impl InstructionTable {
    /// The table compiled into the crate.
    pub fn builtin() -> PlagiResult<Self> {
        Self::load(None)
    }

    /// Load the built-in table, merging `override_path` over it when given.
    pub fn load(override_path: Option<&str>) -> PlagiResult<Self> {
        let mut figment = Figment::from(Toml::string(BUILTIN));
        if let Some(path) = override_path {
            figment = figment.merge(Toml::file(path));
        }
        let raw: RawTable = figment
            .extract()
            .map_err(|e| PlagiError::InternalError(format!("invalid instruction table: {e}")))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawTable) -> PlagiResult<Self> {
        let modes = RewriteMode::ALL
            .into_iter()
            .map(|mode| match raw.modes.get(mode.as_str()) {
                Some(text) => Ok((mode, text.clone())),
                None => Err(PlagiError::InternalError(format!(
                    "instruction table has no directive for mode {mode}"
                ))),
            })
            .collect::<PlagiResult<HashMap<_, _>>>()?;

        let tones = RewriteTone::ALL
            .into_iter()
            .map(|tone| match raw.tones.get(tone.as_str()) {
                Some(text) => Ok((tone, text.clone())),
                None => Err(PlagiError::InternalError(format!(
                    "instruction table has no directive for tone {tone}"
                ))),
            })
            .collect::<PlagiResult<HashMap<_, _>>>()?;

        Ok(Self {
            preamble: raw.preamble,
            rules: raw.rules,
            closing: raw.closing,
            modes,
            tones,
        })
    }

    pub fn mode_directive(&self, mode: RewriteMode) -> &str {
        self.modes.get(&mode).map(String::as_str).unwrap_or_default()
    }

    pub fn tone_directive(&self, tone: RewriteTone) -> &str {
        self.tones.get(&tone).map(String::as_str).unwrap_or_default()
    }

    /// Compose the full system message for one rewrite.
    pub fn system_instructions(&self, mode: RewriteMode, tone: RewriteTone) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            "{}\n\nRewriting Mode: {}\n{}\n\nTone: {}\n{}\n\nCRITICAL RULES:\n",
            self.preamble,
            mode.as_str().to_uppercase(),
            self.mode_directive(mode),
            tone.as_str().to_uppercase(),
            self.tone_directive(tone),
        );
        for (i, rule) in self.rules.iter().enumerate() {
            let _ = writeln!(out, "{}. {rule}", i + 1);
        }
        let _ = write!(out, "\n{}", self.closing);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn builtin_covers_every_mode_and_tone() {
        let table = InstructionTable::builtin().unwrap();
        for mode in RewriteMode::ALL {
            assert!(!table.mode_directive(mode).is_empty(), "{mode}");
        }
        for tone in RewriteTone::ALL {
            assert!(!table.tone_directive(tone).is_empty(), "{tone}");
        }
    }

    #[test]
    fn system_message_layout() {
        let table = InstructionTable::builtin().unwrap();
        let msg = table.system_instructions(RewriteMode::HumanLike, RewriteTone::Casual);

        assert!(msg.starts_with("You are an expert text rewriting assistant."));
        assert!(msg.contains("Rewriting Mode: HUMAN-LIKE\nRewrite in a natural, conversational style."));
        assert!(msg.contains("Tone: CASUAL\nUse friendly, approachable language."));
        assert!(msg.contains("CRITICAL RULES:\n1. NEVER copy sentence structures directly\n"));
        assert!(msg.contains("8. Maintain proper paragraph breaks\n"));
        assert!(msg.ends_with("without any explanations, introductions, or meta-commentary."));
    }

    #[test]
    fn override_file_replaces_single_entries() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "instructions.toml",
                r#"
                [tones]
                formal = "Be stiff."
                "#,
            )?;
            let table = InstructionTable::load(Some("instructions.toml")).unwrap();
            assert_eq!(table.tone_directive(RewriteTone::Formal), "Be stiff.");
            assert!(table.tone_directive(RewriteTone::Casual).starts_with("Use friendly"));
            Ok(())
        });
    }

    #[test]
    fn incomplete_table_is_rejected() {
        let raw = RawTable {
            preamble: String::new(),
            rules: vec![],
            closing: String::new(),
            modes: BTreeMap::new(),
            tones: BTreeMap::new(),
        };
        let err = InstructionTable::from_raw(raw).unwrap_err();
        assert!(err.to_string().contains("mode light"));
    }
}
