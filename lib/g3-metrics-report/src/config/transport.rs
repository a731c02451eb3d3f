/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;

use anyhow::{Context, anyhow};
use http::uri::PathAndQuery;
use http::{HeaderValue, header};
use yaml_rust::{Yaml, yaml};

use super::yaml as y;
use crate::transport::{
    AnyBulkTransport, BulkJsonEncoder, DiscardTransport, HttpBulkTransport, HttpTransportConfig,
    InfluxdbLineEncoder, MemoryTransport, TimestampPrecision,
};

const CONFIG_KEY_TRANSPORT_TYPE: &str = "type";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InfluxdbApiVersion {
    V1,
    #[default]
    V2,
    V3,
}

impl FromStr for InfluxdbApiVersion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1" | "v1" => Ok(InfluxdbApiVersion::V1),
            "2" | "v2" => Ok(InfluxdbApiVersion::V2),
            "3" | "v3" => Ok(InfluxdbApiVersion::V3),
            _ => Err(anyhow!("unsupported influxdb api version {s}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfluxdbTransportConfig {
    pub http: HttpTransportConfig,
    pub version: InfluxdbApiVersion,
    pub database: String,
    pub precision: TimestampPrecision,
    token: Option<String>,
}

impl Default for InfluxdbTransportConfig {
    fn default() -> Self {
        InfluxdbTransportConfig {
            http: HttpTransportConfig::new("", 8086),
            version: InfluxdbApiVersion::default(),
            database: String::new(),
            precision: TimestampPrecision::default(),
            token: None,
        }
    }
}

impl InfluxdbTransportConfig {
    pub fn build_api_path(&self) -> anyhow::Result<PathAndQuery> {
        let path = match self.version {
            InfluxdbApiVersion::V1 => format!(
                "/write?db={}&precision={}",
                self.database,
                self.precision.v1_query_value()
            ),
            InfluxdbApiVersion::V2 => format!(
                "/api/v2/write?bucket={}&precision={}",
                self.database,
                self.precision.v2_query_value()
            ),
            InfluxdbApiVersion::V3 => format!(
                "/api/v3/write_lp?db={}&precision={}",
                self.database,
                self.precision.v3_query_value()
            ),
        };
        PathAndQuery::from_str(&path).map_err(|e| anyhow!("invalid influxdb api path {path}: {e}"))
    }

    fn set(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match y::normalize_key(k).as_str() {
            "api_version" | "version" => {
                let s = y::as_string(v)?;
                self.version = InfluxdbApiVersion::from_str(&s)
                    .context(format!("invalid influxdb api version value for key {k}"))?;
                Ok(())
            }
            "database" | "bucket" => {
                self.database = y::as_string(v)?;
                Ok(())
            }
            "precision" => {
                let s = y::as_string(v)?;
                self.precision = TimestampPrecision::from_str(&s)
                    .context(format!("invalid timestamp precision value for key {k}"))?;
                Ok(())
            }
            "token" => {
                self.token = Some(y::as_string(v)?);
                Ok(())
            }
            _ => set_http_kv(&mut self.http, k, v),
        }
    }

    fn check(&mut self) -> anyhow::Result<()> {
        if self.database.is_empty() {
            return Err(anyhow!("database is not set"));
        }
        self.http.check()?;
        let path = self.build_api_path()?;
        self.http.set_api_path(path);
        self.http
            .add_header(header::ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &self.token {
            self.http.set_auth_token("Token", token)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElasticsearchTransportConfig {
    pub http: HttpTransportConfig,
    pub index: String,
    pub type_in_action: bool,
    token: Option<String>,
}

impl Default for ElasticsearchTransportConfig {
    fn default() -> Self {
        ElasticsearchTransportConfig {
            http: HttpTransportConfig::new("", 9200),
            index: String::new(),
            type_in_action: true,
            token: None,
        }
    }
}

impl ElasticsearchTransportConfig {
    fn set(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match y::normalize_key(k).as_str() {
            "index" => {
                self.index = y::as_string(v)?;
                Ok(())
            }
            "type_in_action" => {
                self.type_in_action = y::as_bool(v)?;
                Ok(())
            }
            "token" | "api_key" => {
                self.token = Some(y::as_string(v)?);
                Ok(())
            }
            _ => set_http_kv(&mut self.http, k, v),
        }
    }

    fn check(&mut self) -> anyhow::Result<()> {
        if self.index.is_empty() {
            return Err(anyhow!("index is not set"));
        }
        self.http.check()?;
        self.http.set_api_path(PathAndQuery::from_static("/_bulk"));
        self.http
            .add_header(header::ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &self.token {
            self.http.set_auth_token("ApiKey", token)?;
        }
        Ok(())
    }
}

fn set_http_kv(http: &mut HttpTransportConfig, k: &str, v: &Yaml) -> anyhow::Result<()> {
    match y::normalize_key(k).as_str() {
        "host" | "server" => {
            http.set_host(y::as_string(v)?);
            Ok(())
        }
        "port" => {
            http.set_port(y::as_u16(v)?);
            Ok(())
        }
        "connect_timeout" => {
            let timeout = y::as_duration(v)
                .context(format!("invalid humanize duration value for key {k}"))?;
            http.set_connect_timeout(timeout);
            Ok(())
        }
        "rsp_header_max_size" => {
            let size = y::as_humanize_usize(v)
                .context(format!("invalid humanize usize value for key {k}"))?;
            http.set_rsp_header_max_size(size);
            Ok(())
        }
        "rsp_body_max_size" => {
            let size = y::as_humanize_usize(v)
                .context(format!("invalid humanize usize value for key {k}"))?;
            http.set_rsp_body_max_size(size);
            Ok(())
        }
        _ => Err(anyhow!("invalid key {k}")),
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TransportConfig {
    #[default]
    Discard,
    Memory,
    Influxdb(InfluxdbTransportConfig),
    Elasticsearch(ElasticsearchTransportConfig),
}

impl TransportConfig {
    pub(crate) fn parse_yaml(v: &Yaml) -> anyhow::Result<Self> {
        match v {
            Yaml::Hash(map) => TransportConfig::parse_map(map),
            Yaml::String(s) => TransportConfig::with_type(s),
            _ => Err(anyhow!(
                "yaml value type for transport should be 'map' or 'string'"
            )),
        }
    }

    fn with_type(s: &str) -> anyhow::Result<Self> {
        match y::normalize_key(s).as_str() {
            "discard" => Ok(TransportConfig::Discard),
            "memory" => Ok(TransportConfig::Memory),
            "influxdb" => Ok(TransportConfig::Influxdb(Default::default())),
            "elasticsearch" | "es" => Ok(TransportConfig::Elasticsearch(Default::default())),
            _ => Err(anyhow!("unsupported transport type {s}")),
        }
    }

    fn parse_map(map: &yaml::Hash) -> anyhow::Result<Self> {
        let type_key = Yaml::String(CONFIG_KEY_TRANSPORT_TYPE.to_string());
        let Some(type_v) = map.get(&type_key) else {
            return Err(anyhow!("no transport type set"));
        };
        let mut config = TransportConfig::with_type(&y::as_string(type_v)?)?;

        y::foreach_kv(map, |k, v| {
            if y::normalize_key(k) == CONFIG_KEY_TRANSPORT_TYPE {
                return Ok(());
            }
            match &mut config {
                TransportConfig::Discard | TransportConfig::Memory => {
                    Err(anyhow!("invalid key {k}"))
                }
                TransportConfig::Influxdb(c) => c.set(k, v),
                TransportConfig::Elasticsearch(c) => c.set(k, v),
            }
        })?;

        match &mut config {
            TransportConfig::Discard | TransportConfig::Memory => {}
            TransportConfig::Influxdb(c) => c.check().context("invalid influxdb transport")?,
            TransportConfig::Elasticsearch(c) => {
                c.check().context("invalid elasticsearch transport")?
            }
        }
        Ok(config)
    }

    pub(crate) fn build(&self, reporter: &str) -> AnyBulkTransport {
        match self {
            TransportConfig::Discard => AnyBulkTransport::Discard(DiscardTransport),
            TransportConfig::Memory => AnyBulkTransport::Memory(MemoryTransport::default()),
            TransportConfig::Influxdb(c) => AnyBulkTransport::Influxdb(HttpBulkTransport::new(
                reporter,
                c.http.clone(),
                InfluxdbLineEncoder::new(c.precision),
            )),
            TransportConfig::Elasticsearch(c) => {
                let encoder =
                    BulkJsonEncoder::new(&c.index).with_type_in_action(c.type_in_action);
                AnyBulkTransport::BulkJson(HttpBulkTransport::new(
                    reporter,
                    c.http.clone(),
                    encoder,
                ))
            }
        }
    }
}
