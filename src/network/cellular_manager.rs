//! Cellular modems through ModemManager's `mmcli`

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use super::modem::{gsm_rssi, Modem};
use crate::command::{CommandOutput, CommandRunner};
use crate::error::{GatewayError, GatewayResult};

/// Signal polling interval requested when no signal data is available, in seconds
const SIGNAL_POLL_RATE: u32 = 300;

pub struct CellularManager {
    runner: Arc<dyn CommandRunner>,
}

impl CellularManager {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    async fn mmcli(&self, command: &str) -> GatewayResult<CommandOutput> {
        let output = self.runner.run(command, true, None).await?;
        if !output.is_success() {
            return Err(GatewayError::ModemManager(output.stderr));
        }
        Ok(output)
    }

    async fn mmcli_json(&self, command: &str) -> GatewayResult<Value> {
        let output = self.mmcli(command).await?;
        serde_json::from_str(&output.stdout)
            .map_err(|e| GatewayError::ModemManager(format!("Invalid JSON from '{}': {}", command, e)))
    }

    /// Ask ModemManager to look for new modems
    pub async fn scan_modems(&self) -> GatewayResult<()> {
        self.mmcli("mmcli --scan-modems").await?;
        info!("Requested modem scan");
        Ok(())
    }

    pub async fn list_modems(&self) -> GatewayResult<Vec<Modem>> {
        let list = self.mmcli_json("mmcli --list-modems --output-json").await?;
        let paths: Vec<String> = list["modem-list"]
            .as_array()
            .map(|paths| paths.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();

        let mut modems = Vec::with_capacity(paths.len());
        for path in paths {
            let modem = self.mmcli_json(&format!("mmcli -m {} --output-json", path)).await?;
            let signal = self.signal(&path).await?;
            modems.push(Modem::from_mmcli_json(&modem, &signal)?);
        }
        Ok(modems)
    }

    /// Signal report of a modem; enables polling first if it is not set up yet
    async fn signal(&self, path: &str) -> GatewayResult<Value> {
        let command = format!("mmcli -m {} --signal-get --output-json", path);
        let signal = self.mmcli_json(&command).await?;
        if gsm_rssi(&signal).is_some() {
            return Ok(signal);
        }
        debug!("No signal data for {}, enabling polling", path);
        self.mmcli(&format!("mmcli -m {} --signal-setup={}", path, SIGNAL_POLL_RATE)).await?;
        self.mmcli_json(&command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::MockCommandRunner;
    use crate::network::modem::ModemState;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PATH: &str = "/org/freedesktop/ModemManager1/Modem/3";

    const MODEM: &str = r#"{"modem":{"3gpp":{"operator-name":"T-Mobile CZ"},"generic":{
        "manufacturer":"huawei","model":"E3131","equipment-identifier":"862570024875048",
        "primary-port":"ttyUSB2","state":"connected","state-failed-reason":"--",
        "signal-quality":{"recent":"yes","value":"74"},"access-technologies":["umts"]}}}"#;

    const NO_SIGNAL: &str = r#"{"modem":{"signal":{"gsm":{"error-rate":"--","rssi":"--"},"refresh":{"rate":"0"}}}}"#;
    const SIGNAL: &str = r#"{"modem":{"signal":{"gsm":{"error-rate":"--","rssi":"-67,00"},"refresh":{"rate":"300"}}}}"#;

    fn expect(mock: &mut MockCommandRunner, command: &'static str, stdout: &'static str) {
        mock.expect_run()
            .withf(move |cmd, sudo, _| cmd == command && *sudo)
            .times(1)
            .returning(move |cmd, _, _| Ok(CommandOutput::new(cmd, stdout, "", 0)));
    }

    #[tokio::test]
    async fn test_scan_modems() {
        let mut mock = MockCommandRunner::new();
        expect(&mut mock, "mmcli --scan-modems", "successfully requested to scan devices");
        CellularManager::new(Arc::new(mock)).scan_modems().await.unwrap();
    }

    #[tokio::test]
    async fn test_list_modems_sets_up_signal_polling() {
        let mut mock = MockCommandRunner::new();
        expect(&mut mock, "mmcli --list-modems --output-json", r#"{"modem-list":["/org/freedesktop/ModemManager1/Modem/3"]}"#);
        expect(&mut mock, "mmcli -m /org/freedesktop/ModemManager1/Modem/3 --output-json", MODEM);
        expect(
            &mut mock,
            "mmcli -m /org/freedesktop/ModemManager1/Modem/3 --signal-setup=300",
            "Successfully setup signal quality information polling",
        );

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        mock.expect_run()
            .withf(|cmd, _, _| cmd == format!("mmcli -m {} --signal-get --output-json", PATH))
            .times(2)
            .returning(move |cmd, _, _| {
                let stdout = if counter.fetch_add(1, Ordering::SeqCst) == 0 { NO_SIGNAL } else { SIGNAL };
                Ok(CommandOutput::new(cmd, stdout, "", 0))
            });

        let modems = CellularManager::new(Arc::new(mock)).list_modems().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(modems.len(), 1);
        let modem = &modems[0];
        assert_eq!(modem.interface, "ttyUSB2");
        assert_eq!(modem.imei, "862570024875048");
        assert_eq!(modem.state, ModemState::Connected);
        let radio = modem.radio.as_ref().unwrap();
        assert_eq!(radio.signal, Some(74));
        assert_eq!(radio.rssi, Some(-67.0));
    }

    #[tokio::test]
    async fn test_list_modems_empty() {
        let mut mock = MockCommandRunner::new();
        expect(&mut mock, "mmcli --list-modems --output-json", r#"{"modem-list":[]}"#);
        assert!(CellularManager::new(Arc::new(mock)).list_modems().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mmcli_failure() {
        let mut mock = MockCommandRunner::new();
        mock.expect_run()
            .returning(|cmd, _, _| Ok(CommandOutput::new(cmd, "", "error: couldn't find the ModemManager process", 1)));
        let err = CellularManager::new(Arc::new(mock)).list_modems().await.unwrap_err();
        assert!(matches!(err, GatewayError::ModemManager(_)));
    }
}
