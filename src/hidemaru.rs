// ── Root facade ───────────────────────────────────────────────────────────────
//
// `Hidemaru` owns the host and hands out borrowed facades for each area.
// There is no shared state between facades; each call goes straight through.

use std::fmt::Display;

use crate::{
    config::Config,
    edit::Edit,
    error::Result,
    file::File,
    host::Host,
    macros::Macro,
    output_pane::OutputPane,
    version::HmVersion,
};

/// Entry point for scripts.
pub struct Hidemaru<H: Host> {
    host: H,
    echo_debug: bool,
}

impl<H: Host> Hidemaru<H> {
    pub fn new(host: H) -> Self {
        Self { host, echo_debug: false }
    }

    pub fn with_config(host: H, config: &Config) -> Self {
        Self {
            host,
            echo_debug: config.echo_debug_to_log,
        }
    }

    pub fn file(&self) -> File<'_, H> {
        File::new(&self.host)
    }

    pub fn edit(&self) -> Edit<'_, H> {
        Edit::new(&self.host)
    }

    pub fn macros(&self) -> Macro<'_, H> {
        Macro::new(&self.host)
    }

    pub fn output_pane(&self) -> OutputPane<'_, H> {
        OutputPane::new(&self.host)
    }

    /// Write `obj` to the host's debug monitor.
    pub fn debug_info(&self, obj: impl Display) -> Result<()> {
        let text = obj.to_string();
        if self.echo_debug {
            log::debug!("{text}");
        }
        self.host.debug_info(&text)
    }

    /// Host version, e.g. `866.05`.
    pub fn version(&self) -> Result<HmVersion> {
        self.host.version()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }
}

#[cfg(windows)]
impl Hidemaru<crate::host::native::NativeHost> {
    /// Bind to the Hidemaru process this code is running in, using the
    /// configuration file if there is one.
    pub fn attach() -> Result<Self> {
        let config = Config::load();
        let host = crate::host::native::NativeHost::bind(&config)?;
        Ok(Self::with_config(host, &config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::{Call, MemoryHost};

    #[test]
    fn debug_info_formats_any_display() {
        let hm = Hidemaru::new(MemoryHost::new());
        hm.debug_info(42).expect("int");
        hm.debug_info(format_args!("{}-{}", "a", 1)).expect("args");
        assert_eq!(hm.host().debug_log(), vec!["42".to_owned(), "a-1".to_owned()]);
    }

    #[test]
    fn version_is_forwarded() {
        let hm = Hidemaru::new(MemoryHost::new().with_version(HmVersion(866.05)));
        assert_eq!(hm.version().expect("version"), HmVersion(866.05));
        assert_eq!(hm.host().calls(), vec![Call::Version]);
    }

    #[test]
    fn facades_share_one_host() {
        let hm = Hidemaru::new(MemoryHost::new().with_text("abc"));
        hm.macros().var().set("$t", hm.edit().total_text().expect("text")).expect("set");
        hm.output_pane().output("done").expect("output");
        assert_eq!(
            hm.macros().var().get("$t").expect("get").as_str(),
            Some("abc")
        );
        let host = hm.into_host();
        assert_eq!(host.pane_lines(), vec!["done".to_owned()]);
    }

    #[test]
    fn config_enables_log_echo() {
        let cfg = Config { echo_debug_to_log: true, ..Config::default() };
        let hm = Hidemaru::with_config(MemoryHost::new(), &cfg);
        hm.debug_info("echoed").expect("debug");
        assert_eq!(hm.host().debug_log(), vec!["echoed".to_owned()]);
    }
}
