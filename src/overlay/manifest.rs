//! Baked game manifest
//!
//! Every baked game carries a freshly generated `modinfo.lua` so the engine
//! sees it as a composite game in its own right. The content depends only on
//! the base identity, the ordered overlay list and the combination key.

use crate::cache::CombinationKey;
use crate::error::{BakeError, BakeResult};
use crate::overlay::{ArtifactRef, OverlayRef, MANIFEST_FILE};
use serde::Serialize;
use std::path::Path;

/// `modtype` value the engine uses for a playable (primary) game
pub const MODTYPE_GAME: u8 = 1;

/// Synthesized manifest for a baked game
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BakedManifest {
    /// Composite display name, e.g. "byar + patch v1"
    pub name: String,

    pub description: String,

    /// Synthesized version tag
    pub version: String,

    /// Short identity (`baked-<key>`), distinct from any input's
    pub shortname: String,

    pub game: String,

    pub short_game: String,

    pub modtype: u8,

    /// Always empty: dependencies declared by the base are not inherited yet
    pub depend: Vec<String>,
}

impl BakedManifest {
    /// Build the manifest for one combination
    pub fn for_combination(
        base: &ArtifactRef,
        overlays: &[OverlayRef],
        key: &CombinationKey,
    ) -> Self {
        let mut name = base.base_type.clone();
        for overlay in overlays {
            name.push_str(" + ");
            name.push_str(&overlay.to_string());
        }

        let description = if overlays.is_empty() {
            format!("{} baked without overlays", base.base_type)
        } else {
            let applied: Vec<String> = overlays.iter().map(|o| o.to_string()).collect();
            format!(
                "{} baked with overlays (in order): {}",
                base.base_type,
                applied.join(", ")
            )
        };

        let shortname = key.artifact_name();

        Self {
            game: name.clone(),
            name,
            description,
            version: shortname.clone(),
            short_game: shortname.clone(),
            shortname,
            modtype: MODTYPE_GAME,
            depend: Vec::new(),
        }
    }

    /// Render as a Lua table the engine can load
    pub fn render(&self) -> String {
        let depend: Vec<String> = self.depend.iter().map(|d| lua_quote(d)).collect();

        let mut lines = Vec::new();
        lines.push("local modinfo = {".to_string());
        lines.push(format!("\tname = {},", lua_quote(&self.name)));
        lines.push(format!("\tdescription = {},", lua_quote(&self.description)));
        lines.push(format!("\tversion = {},", lua_quote(&self.version)));
        lines.push(format!("\tshortname = {},", lua_quote(&self.shortname)));
        lines.push(format!("\tgame = {},", lua_quote(&self.game)));
        lines.push(format!("\tshortGame = {},", lua_quote(&self.short_game)));
        lines.push(format!("\tmodtype = {},", self.modtype));
        lines.push(format!("\tdepend = {{{}}},", depend.join(", ")));
        lines.push("}".to_string());
        lines.push(String::new());
        lines.push("return modinfo".to_string());
        lines.push(String::new());

        lines.join("\n")
    }

    /// Write `modinfo.lua` into `dir`, replacing any copy inherited from the base
    pub async fn write_to(&self, dir: &Path) -> BakeResult<()> {
        let path = dir.join(MANIFEST_FILE);
        // The inherited copy keeps the base's permissions and may be read-only
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(BakeError::io(
                    format!("replacing manifest {}", path.display()),
                    e,
                ))
            }
        }
        tokio::fs::write(&path, self.render())
            .await
            .map_err(|e| BakeError::io(format!("writing manifest {}", path.display()), e))
    }
}

/// Read a top-level string field (`key = "value",`) back out of a manifest.
///
/// Only understands the flat layout produced by [`BakedManifest::render`];
/// returns `None` for anything else.
pub fn read_string_field(content: &str, key: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let rest = line.trim().strip_prefix(key)?.trim_start();
        let rest = rest.strip_prefix('=')?.trim();
        let rest = rest.strip_suffix(',').unwrap_or(rest);
        lua_unquote(rest)
    })
}

/// Quote a value as a Lua string literal.
/// Backslashes, quotes and control characters are escaped.
fn lua_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\{:03}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn lua_unquote(literal: &str) -> Option<String> {
    let inner = literal.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            d if d.is_ascii_digit() => {
                let mut code = d.to_digit(10)?;
                for _ in 0..2 {
                    code = code * 10 + chars.next()?.to_digit(10)?;
                }
                out.push(char::from_u32(code)?);
            }
            other => out.push(other),
        }
    }
    Some(out)
}
