/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use anyhow::{Context, anyhow};
use yaml_rust::{Yaml, YamlLoader};

use crate::report::ReportRunController;
use crate::transport::AnyBulkTransport;
use crate::types::{MetricNameFormatter, MetricTagMap};

mod yaml;

mod transport;
pub use transport::{
    ElasticsearchTransportConfig, InfluxdbApiVersion, InfluxdbTransportConfig, TransportConfig,
};

const CONFIG_KEY_REPORTER_NAME: &str = "name";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReporterConfig {
    pub name: String,
    pub report_interval: Duration,
    pub flush_timeout: Duration,
    pub global_tags: MetricTagMap,
    pub prefix: Option<String>,
    pub delimiter: char,
    pub transport: TransportConfig,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        ReporterConfig {
            name: String::new(),
            report_interval: Duration::from_secs(10),
            flush_timeout: Duration::from_secs(30),
            global_tags: MetricTagMap::default(),
            prefix: None,
            delimiter: '.',
            transport: TransportConfig::default(),
        }
    }
}

impl ReporterConfig {
    pub fn parse_yaml(v: &Yaml) -> anyhow::Result<Self> {
        if let Yaml::Hash(map) = v {
            ReporterConfig::parse(map)
        } else {
            Err(anyhow!("yaml value type for reporter should be 'map'"))
        }
    }

    /// Load from the first document of a yaml string.
    pub fn load_str(s: &str) -> anyhow::Result<Self> {
        let docs = YamlLoader::load_from_str(s).map_err(|e| anyhow!("invalid yaml: {e}"))?;
        let Some(doc) = docs.first() else {
            return Err(anyhow!("empty yaml document"));
        };
        ReporterConfig::parse_yaml(doc)
    }

    fn parse(map: &yaml_rust::yaml::Hash) -> anyhow::Result<Self> {
        let mut config = ReporterConfig::default();
        yaml::foreach_kv(map, |k, v| config.set(k, v))?;
        config.check()?;
        Ok(config)
    }

    fn set(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match yaml::normalize_key(k).as_str() {
            CONFIG_KEY_REPORTER_NAME => {
                self.name = yaml::as_string(v)?;
                Ok(())
            }
            "report_interval" | "emit_interval" => {
                self.report_interval = yaml::as_duration(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
                Ok(())
            }
            "flush_timeout" => {
                self.flush_timeout = yaml::as_duration(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
                Ok(())
            }
            "global_tags" => {
                self.global_tags = yaml::as_tag_map(v)?;
                Ok(())
            }
            "prefix" => {
                let prefix = yaml::as_string(v)?;
                self.prefix = if prefix.is_empty() { None } else { Some(prefix) };
                Ok(())
            }
            "delimiter" => {
                self.delimiter = yaml::as_char(v)?;
                Ok(())
            }
            "transport" => {
                self.transport = TransportConfig::parse_yaml(v)
                    .context(format!("invalid transport value for key {k}"))?;
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k}")),
        }
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.name.is_empty() {
            return Err(anyhow!("name is not set"));
        }
        if self.report_interval.is_zero() {
            return Err(anyhow!("report interval should not be zero"));
        }
        Ok(())
    }

    pub fn name_formatter(&self) -> MetricNameFormatter {
        match &self.prefix {
            Some(prefix) => MetricNameFormatter::with_prefix(prefix.as_str(), self.delimiter),
            None => MetricNameFormatter::Delimited {
                prefix: None,
                delimiter: self.delimiter,
            },
        }
    }

    pub fn build(&self) -> ReportRunController<AnyBulkTransport> {
        ReportRunController::new(
            self.name.as_str(),
            self.name_formatter(),
            self.global_tags.clone(),
            self.transport.build(&self.name),
        )
        .with_report_interval(self.report_interval)
        .with_flush_timeout(self.flush_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MetricValueSource;

    #[test]
    fn defaults() {
        let config = ReporterConfig::load_str("name: app").unwrap();
        assert_eq!(config.name, "app");
        assert_eq!(config.report_interval, Duration::from_secs(10));
        assert_eq!(config.flush_timeout, Duration::from_secs(30));
        assert_eq!(config.delimiter, '.');
        assert_eq!(config.transport, TransportConfig::Discard);
    }

    #[test]
    fn full() {
        let config = ReporterConfig::load_str(
            r#"
            name: app
            emit-interval: 1m
            flush_timeout: 5s
            global_tags:
              env: prod
              dc: sh
            prefix: svc
            delimiter: "_"
            transport:
              type: influxdb
              host: 127.0.0.1
              database: metrics
            "#,
        )
        .unwrap();
        assert_eq!(config.report_interval, Duration::from_secs(60));
        assert_eq!(config.flush_timeout, Duration::from_secs(5));
        let tags: Vec<_> = config.global_tags.iter().collect();
        assert_eq!(tags, [("env", "prod"), ("dc", "sh")]);
        assert_eq!(config.name_formatter().format("db", "conn"), "svc_db_conn");
        assert!(matches!(config.transport, TransportConfig::Influxdb(_)));

        let controller = config.build();
        assert_eq!(controller.name(), "app");
        assert_eq!(controller.report_interval(), Duration::from_secs(60));
        assert!(matches!(controller.transport(), AnyBulkTransport::Influxdb(_)));
    }

    #[test]
    fn invalid() {
        assert!(ReporterConfig::load_str("report_interval: 10s").is_err());
        assert!(ReporterConfig::load_str("{name: app, unknown: 1}").is_err());
        assert!(ReporterConfig::load_str("{name: app, delimiter: '::'}").is_err());
        assert!(ReporterConfig::load_str("{name: app, report_interval: 0}").is_err());
        assert!(ReporterConfig::load_str("[name]").is_err());
    }

    #[tokio::test]
    async fn build_memory() {
        let config = ReporterConfig::load_str(
            r#"
            name: mem
            global_tags: "host:h1"
            transport: memory
            "#,
        )
        .unwrap();
        let mut controller = config.build();
        let AnyBulkTransport::Memory(observer) = controller.transport() else {
            panic!("not a memory transport");
        };
        let observer = observer.clone();

        controller.start_report_run();
        controller.report_metric("app", &MetricValueSource::gauge("up", 1.0));
        assert!(controller.end_and_flush_report_run().await);

        let batch = observer.last_batch().unwrap();
        assert_eq!(batch[0].name, "app.up");
        assert_eq!(batch[0].tags.get("host"), Some("h1"));
    }
}
