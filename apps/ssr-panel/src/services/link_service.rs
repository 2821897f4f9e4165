//! Connection links for a (user, node) pair: legacy and extended `ss://`,
//! `ssr://`, the JSON connection info and a surge device profile.
//!
//! Everything here is pure; equal inputs produce byte-identical output.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use serde::Serialize;
use ssr_db::models::node::Node;
use ssr_db::models::user::User;

const COMPATIBLE_SUFFIX: &str = "_compatible";

/// Obfs plugins whose parameters only fit in the extended link.
const EXTENDED_OBFS: &[&str] = &["http_post", "http_simple", "random_head", "tls1.2_ticket_auth"];

const EXTENDED_PROTOCOLS: &[&str] = &[
    "verify_deflate",
    "auth_chain_a",
    "auth_sha1_v4",
    "auth_aes128_md5",
    "auth_aes128_sha1",
];

/// Obfs plugins that take a user supplied parameter.
const PARAM_OBFS: &[&str] = &["http_post", "http_simple"];

#[derive(Debug, Clone, Copy)]
pub struct ProxyCredentials<'a> {
    pub port: i64,
    pub password: &'a str,
    pub method: &'a str,
    pub protocol: &'a str,
    pub obfs: &'a str,
    pub obfs_param: Option<&'a str>,
}

impl<'a> From<&'a User> for ProxyCredentials<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            port: user.port,
            password: &user.passwd,
            method: &user.method,
            protocol: &user.protocol,
            obfs: &user.obfs,
            obfs_param: user.obfs_param.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NodeEndpoint<'a> {
    pub server: &'a str,
    pub name: &'a str,
}

impl<'a> From<&'a Node> for NodeEndpoint<'a> {
    fn from(node: &'a Node) -> Self {
        Self {
            server: &node.server,
            name: &node.name,
        }
    }
}

/// Connection parameters shown to the user for manual client setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SsInfo {
    pub server: String,
    pub server_port: i64,
    pub password: String,
    pub method: String,
    pub protocol: String,
    pub obfs: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obfs_param: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurgeProfile {
    /// Link to the shared base profile
    pub base_url: String,
    pub proxy: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLinks {
    pub ss: String,
    pub ss_extended: String,
    pub ssr: String,
    /// True when the plugins in use cannot be expressed by the legacy `ss://` link
    pub extended_required: bool,
    pub info: SsInfo,
    pub surge: SurgeProfile,
}

impl NodeLinks {
    /// The link offered for QR scanning.
    pub fn primary(&self) -> &str {
        if self.extended_required {
            &self.ss_extended
        } else {
            &self.ss
        }
    }

    pub fn info_json(&self) -> String {
        serde_json::to_string_pretty(&self.info).unwrap_or_default()
    }
}

/// Maps a `_compatible` alias to the plugin name used on the wire.
pub fn canonical_name(name: &str) -> &str {
    name.strip_suffix(COMPATIBLE_SUFFIX).unwrap_or(name)
}

pub fn requires_extended_form(protocol: &str, obfs: &str) -> bool {
    EXTENDED_OBFS.contains(&canonical_name(obfs))
        || EXTENDED_PROTOCOLS.contains(&canonical_name(protocol))
}

pub fn base64_encode(raw: &str) -> String {
    STANDARD.encode(raw.as_bytes())
}

pub fn base64_url_encode(raw: &str) -> String {
    URL_SAFE_NO_PAD.encode(raw.as_bytes())
}

/// `ss://` + base64(`method:password@server:port`)
pub fn ss_link(creds: &ProxyCredentials<'_>, node: &NodeEndpoint<'_>) -> String {
    let plain = format!(
        "{}:{}@{}:{}",
        creds.method, creds.password, node.server, creds.port
    );
    format!("ss://{}", base64_encode(&plain))
}

/// `ss://` + base64(`obfs:protocol:method:password@server:port/base64(obfs_param)`)
pub fn ss_extended_link(creds: &ProxyCredentials<'_>, node: &NodeEndpoint<'_>) -> String {
    let plain = format!(
        "{}:{}:{}:{}@{}:{}/{}",
        canonical_name(creds.obfs),
        canonical_name(creds.protocol),
        creds.method,
        creds.password,
        node.server,
        creds.port,
        base64_encode(creds.obfs_param.unwrap_or_default())
    );
    format!("ss://{}", base64_encode(&plain))
}

/// `ssr://` + base64url(`server:port:protocol:method:obfs:b64url(password)/?obfsparam=..&remarks=..`)
pub fn ssr_link(creds: &ProxyCredentials<'_>, node: &NodeEndpoint<'_>) -> String {
    let plain = format!(
        "{}:{}:{}:{}:{}:{}/?obfsparam={}&remarks={}",
        node.server,
        creds.port,
        canonical_name(creds.protocol),
        creds.method,
        canonical_name(creds.obfs),
        base64_url_encode(creds.password),
        base64_url_encode(creds.obfs_param.unwrap_or_default()),
        base64_url_encode(node.name)
    );
    format!("ssr://{}", base64_url_encode(&plain))
}

pub fn ss_info(creds: &ProxyCredentials<'_>, node: &NodeEndpoint<'_>) -> SsInfo {
    let obfs_param = PARAM_OBFS
        .contains(&canonical_name(creds.obfs))
        .then(|| creds.obfs_param.unwrap_or_default().to_string());

    SsInfo {
        server: node.server.to_string(),
        server_port: creds.port,
        password: creds.password.to_string(),
        method: creds.method.to_string(),
        protocol: creds.protocol.to_string(),
        obfs: creds.obfs.to_string(),
        obfs_param,
    }
}

/// `asset_base` is `scheme://host` of the panel, without a trailing slash.
pub fn surge_profile(
    creds: &ProxyCredentials<'_>,
    node: &NodeEndpoint<'_>,
    asset_base: &str,
) -> SurgeProfile {
    let asset_base = asset_base.trim_end_matches('/');
    let proxy = format!(
        "#!PROXY-OVERRIDE:ProxyBase.conf\n[Proxy]\nProxy = custom,{},{},{},{},{}/downloads/SSEncrypt.module",
        node.server, creds.port, creds.method, creds.password, asset_base
    );

    SurgeProfile {
        base_url: format!("{}/downloads/ProxyBase.conf", asset_base),
        proxy,
    }
}

pub fn encode_node_links(
    creds: &ProxyCredentials<'_>,
    node: &NodeEndpoint<'_>,
    asset_base: &str,
) -> NodeLinks {
    NodeLinks {
        ss: ss_link(creds, node),
        ss_extended: ss_extended_link(creds, node),
        ssr: ssr_link(creds, node),
        extended_required: requires_extended_form(creds.protocol, creds.obfs),
        info: ss_info(creds, node),
        surge: surge_profile(creds, node, asset_base),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds<'a>(
        protocol: &'a str,
        obfs: &'a str,
        obfs_param: Option<&'a str>,
    ) -> ProxyCredentials<'a> {
        ProxyCredentials {
            port: 10086,
            password: "p@ss#w0rd$",
            method: "aes-256-cfb",
            protocol,
            obfs,
            obfs_param,
        }
    }

    fn node() -> NodeEndpoint<'static> {
        NodeEndpoint {
            server: "hk1.example.com",
            name: "香港 01 / HK&BGP",
        }
    }

    fn decode_std(encoded: &str) -> String {
        String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap()
    }

    fn decode_url(encoded: &str) -> String {
        String::from_utf8(URL_SAFE_NO_PAD.decode(encoded).unwrap()).unwrap()
    }

    #[test]
    fn legacy_ss_link_round_trips() {
        let c = creds("origin", "plain", None);
        let link = ss_link(&c, &node());
        let body = link.strip_prefix("ss://").unwrap();
        assert_eq!(decode_std(body), "aes-256-cfb:p@ss#w0rd$@hk1.example.com:10086");
    }

    #[test]
    fn extended_ss_link_carries_plugins_and_param() {
        let c = creds("auth_sha1_v4", "http_simple", Some("cdn.example.com"));
        let link = ss_extended_link(&c, &node());
        let plain = decode_std(link.strip_prefix("ss://").unwrap());

        let (head, param) = plain.rsplit_once('/').unwrap();
        assert_eq!(head, "http_simple:auth_sha1_v4:aes-256-cfb:p@ss#w0rd$@hk1.example.com:10086");
        assert_eq!(decode_std(param), "cdn.example.com");
    }

    #[test]
    fn ssr_link_decodes_back_to_every_field() {
        let c = creds("auth_aes128_md5", "tls1.2_ticket_auth", Some("a=b&c/d"));
        let link = ssr_link(&c, &node());
        let body = link.strip_prefix("ssr://").unwrap();
        assert!(!body.contains('=') && !body.contains('+') && !body.contains('/'));

        let plain = decode_url(body);
        let (main, query) = plain.split_once("/?").unwrap();
        let parts: Vec<&str> = main.split(':').collect();
        assert_eq!(parts[0], "hk1.example.com");
        assert_eq!(parts[1], "10086");
        assert_eq!(parts[2], "auth_aes128_md5");
        assert_eq!(parts[3], "aes-256-cfb");
        assert_eq!(parts[4], "tls1.2_ticket_auth");
        assert_eq!(decode_url(parts[5]), "p@ss#w0rd$");

        let (obfsparam, remarks) = query.split_once('&').unwrap();
        assert_eq!(decode_url(obfsparam.strip_prefix("obfsparam=").unwrap()), "a=b&c/d");
        assert_eq!(decode_url(remarks.strip_prefix("remarks=").unwrap()), "香港 01 / HK&BGP");
    }

    #[test]
    fn absent_obfs_param_encodes_as_empty() {
        let c = creds("origin", "plain", None);
        let plain = decode_url(ssr_link(&c, &node()).strip_prefix("ssr://").unwrap());
        assert!(plain.contains("/?obfsparam=&remarks="));

        let extended = decode_std(ss_extended_link(&c, &node()).strip_prefix("ss://").unwrap());
        assert!(extended.ends_with(":10086/"));
    }

    #[test]
    fn compatible_alias_encodes_like_canonical_name() {
        let node = node();
        let alias = creds("auth_sha1_v4_compatible", "http_post_compatible", Some("x"));
        let plain = creds("auth_sha1_v4", "http_post", Some("x"));

        let a = encode_node_links(&alias, &node, "https://panel.example.com");
        let b = encode_node_links(&plain, &node, "https://panel.example.com");
        assert_eq!(a.ss, b.ss);
        assert_eq!(a.ss_extended, b.ss_extended);
        assert_eq!(a.ssr, b.ssr);
        assert_eq!(a.extended_required, b.extended_required);
        assert_eq!(canonical_name(canonical_name("http_post_compatible")), "http_post");
    }

    #[test]
    fn extended_form_is_primary_only_for_listed_plugins() {
        assert!(requires_extended_form("origin", "http_simple"));
        assert!(requires_extended_form("origin", "tls1.2_ticket_auth_compatible"));
        assert!(requires_extended_form("auth_chain_a", "plain"));
        assert!(requires_extended_form("verify_deflate", "plain"));
        assert!(!requires_extended_form("origin", "plain"));

        let node = node();
        let legacy = encode_node_links(&creds("origin", "plain", None), &node, "http://h");
        assert_eq!(legacy.primary(), legacy.ss);
        let extended = encode_node_links(&creds("auth_chain_a", "plain", None), &node, "http://h");
        assert_eq!(extended.primary(), extended.ss_extended);
    }

    #[test]
    fn info_exposes_param_only_for_http_obfs() {
        let node = node();
        let with = ss_info(&creds("origin", "http_post", None), &node);
        assert_eq!(with.obfs_param.as_deref(), Some(""));

        let without = ss_info(&creds("origin", "random_head", Some("ignored")), &node);
        assert_eq!(without.obfs_param, None);
        let json = serde_json::to_value(&without).unwrap();
        assert!(json.get("obfs_param").is_none());
        assert_eq!(json["server_port"], 10086);
    }

    #[test]
    fn surge_profile_points_at_panel_downloads() {
        let profile = surge_profile(
            &creds("origin", "plain", None),
            &node(),
            "https://panel.example.com/",
        );
        assert_eq!(
            profile.base_url,
            "https://panel.example.com/downloads/ProxyBase.conf"
        );
        assert_eq!(
            profile.proxy,
            "#!PROXY-OVERRIDE:ProxyBase.conf\n[Proxy]\nProxy = custom,hk1.example.com,10086,aes-256-cfb,p@ss#w0rd$,https://panel.example.com/downloads/SSEncrypt.module"
        );
    }

    #[test]
    fn encoding_is_deterministic() {
        let c = creds("auth_chain_a", "http_simple", Some("param"));
        let node = node();
        assert_eq!(
            encode_node_links(&c, &node, "http://h"),
            encode_node_links(&c, &node, "http://h")
        );
    }
}
