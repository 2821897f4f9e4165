use regex::Regex;
use serde::Deserialize;
use sqlx::SqlitePool;
use ssr_db::repositories::user_repo::UserRepository;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::info;

use crate::error::PanelError;

static PASSWORD_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_\-.@#$]{6,16}$").expect("password rule is a valid regex")
});

const PASSWORD_MESSAGE: &str = "SS连接密码不符合规则，只能为6-16位长度，包含数字大小写字母-._@#$";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    None,
    Aes128Cfb,
    Aes192Cfb,
    Aes256Cfb,
    Aes128Cfb8,
    Aes192Cfb8,
    Aes256Cfb8,
    Aes128Ctr,
    Aes192Ctr,
    Aes256Ctr,
    Camellia128Cfb,
    Camellia192Cfb,
    Camellia256Cfb,
    BfCfb,
    Cast5Cfb,
    DesCfb,
    IdeaCfb,
    Rc2Cfb,
    SeedCfb,
    Rc4,
    Rc4Md5,
    Rc4Md5_6,
    Salsa20,
    Chacha20,
    Chacha20Ietf,
    Xsalsa20,
    Xchacha20,
}

impl Method {
    pub const ALL: &'static [Method] = &[
        Method::None,
        Method::Aes128Cfb,
        Method::Aes192Cfb,
        Method::Aes256Cfb,
        Method::Aes128Cfb8,
        Method::Aes192Cfb8,
        Method::Aes256Cfb8,
        Method::Aes128Ctr,
        Method::Aes192Ctr,
        Method::Aes256Ctr,
        Method::Camellia128Cfb,
        Method::Camellia192Cfb,
        Method::Camellia256Cfb,
        Method::BfCfb,
        Method::Cast5Cfb,
        Method::DesCfb,
        Method::IdeaCfb,
        Method::Rc2Cfb,
        Method::SeedCfb,
        Method::Rc4,
        Method::Rc4Md5,
        Method::Rc4Md5_6,
        Method::Salsa20,
        Method::Chacha20,
        Method::Chacha20Ietf,
        Method::Xsalsa20,
        Method::Xchacha20,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::None => "none",
            Method::Aes128Cfb => "aes-128-cfb",
            Method::Aes192Cfb => "aes-192-cfb",
            Method::Aes256Cfb => "aes-256-cfb",
            Method::Aes128Cfb8 => "aes-128-cfb8",
            Method::Aes192Cfb8 => "aes-192-cfb8",
            Method::Aes256Cfb8 => "aes-256-cfb8",
            Method::Aes128Ctr => "aes-128-ctr",
            Method::Aes192Ctr => "aes-192-ctr",
            Method::Aes256Ctr => "aes-256-ctr",
            Method::Camellia128Cfb => "camellia-128-cfb",
            Method::Camellia192Cfb => "camellia-192-cfb",
            Method::Camellia256Cfb => "camellia-256-cfb",
            Method::BfCfb => "bf-cfb",
            Method::Cast5Cfb => "cast5-cfb",
            Method::DesCfb => "des-cfb",
            Method::IdeaCfb => "idea-cfb",
            Method::Rc2Cfb => "rc2-cfb",
            Method::SeedCfb => "seed-cfb",
            Method::Rc4 => "rc4",
            Method::Rc4Md5 => "rc4-md5",
            Method::Rc4Md5_6 => "rc4-md5-6",
            Method::Salsa20 => "salsa20",
            Method::Chacha20 => "chacha20",
            Method::Chacha20Ietf => "chacha20-ietf",
            Method::Xsalsa20 => "xsalsa20",
            Method::Xchacha20 => "xchacha20",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Origin,
    VerifyDeflate,
    AuthSha1V4,
    AuthSha1V4Compatible,
    AuthAes128Md5,
    AuthAes128Sha1,
    AuthChainA,
}

impl Protocol {
    pub const ALL: &'static [Protocol] = &[
        Protocol::Origin,
        Protocol::VerifyDeflate,
        Protocol::AuthSha1V4,
        Protocol::AuthSha1V4Compatible,
        Protocol::AuthAes128Md5,
        Protocol::AuthAes128Sha1,
        Protocol::AuthChainA,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Origin => "origin",
            Protocol::VerifyDeflate => "verify_deflate",
            Protocol::AuthSha1V4 => "auth_sha1_v4",
            Protocol::AuthSha1V4Compatible => "auth_sha1_v4_compatible",
            Protocol::AuthAes128Md5 => "auth_aes128_md5",
            Protocol::AuthAes128Sha1 => "auth_aes128_sha1",
            Protocol::AuthChainA => "auth_chain_a",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Obfs {
    Plain,
    HttpSimple,
    HttpSimpleCompatible,
    HttpPost,
    HttpPostCompatible,
    RandomHead,
    RandomHeadCompatible,
    Tls12TicketAuth,
    Tls12TicketAuthCompatible,
}

impl Obfs {
    pub const ALL: &'static [Obfs] = &[
        Obfs::Plain,
        Obfs::HttpSimple,
        Obfs::HttpSimpleCompatible,
        Obfs::HttpPost,
        Obfs::HttpPostCompatible,
        Obfs::RandomHead,
        Obfs::RandomHeadCompatible,
        Obfs::Tls12TicketAuth,
        Obfs::Tls12TicketAuthCompatible,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Obfs::Plain => "plain",
            Obfs::HttpSimple => "http_simple",
            Obfs::HttpSimpleCompatible => "http_simple_compatible",
            Obfs::HttpPost => "http_post",
            Obfs::HttpPostCompatible => "http_post_compatible",
            Obfs::RandomHead => "random_head",
            Obfs::RandomHeadCompatible => "random_head_compatible",
            Obfs::Tls12TicketAuth => "tls1.2_ticket_auth",
            Obfs::Tls12TicketAuthCompatible => "tls1.2_ticket_auth_compatible",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownOption;

impl FromStr for Method {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.iter().copied().find(|m| m.as_str() == s).ok_or(UnknownOption)
    }
}

impl FromStr for Protocol {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.iter().copied().find(|p| p.as_str() == s).ok_or(UnknownOption)
    }
}

impl FromStr for Obfs {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.iter().copied().find(|o| o.as_str() == s).ok_or(UnknownOption)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Obfs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /dashboard/ssr_edit`. Missing fields arrive as empty strings
/// and fail validation like any other bad value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialForm {
    #[serde(default)]
    pub sspwd: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub obfs: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyCredentialsUpdate {
    pub password: String,
    pub method: Method,
    pub protocol: Protocol,
    pub obfs: Obfs,
}

pub fn is_valid_password(password: &str) -> bool {
    PASSWORD_RULE.is_match(password)
}

impl CredentialForm {
    /// Checks password, method, protocol and obfs in that order and reports the first failure.
    pub fn validate(&self) -> Result<ProxyCredentialsUpdate, PanelError> {
        if !is_valid_password(&self.sspwd) {
            return Err(PanelError::Validation {
                field: "sspwd",
                message: PASSWORD_MESSAGE,
            });
        }
        let method = self.method.parse::<Method>().map_err(|_| PanelError::Validation {
            field: "method",
            message: "加密方法错误",
        })?;
        let protocol = self.protocol.parse::<Protocol>().map_err(|_| PanelError::Validation {
            field: "protocol",
            message: "协议错误",
        })?;
        let obfs = self.obfs.parse::<Obfs>().map_err(|_| PanelError::Validation {
            field: "obfs",
            message: "混淆错误",
        })?;

        Ok(ProxyCredentialsUpdate {
            password: self.sspwd.clone(),
            method,
            protocol,
            obfs,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CredentialService {
    user_repo: UserRepository,
}

impl CredentialService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            user_repo: UserRepository::new(pool),
        }
    }

    pub async fn apply(&self, user_id: i64, form: &CredentialForm) -> Result<(), PanelError> {
        let update = form.validate()?;
        self.user_repo
            .update_credentials(
                user_id,
                &update.password,
                update.method.as_str(),
                update.protocol.as_str(),
                update.obfs.as_str(),
            )
            .await?;

        info!(
            "User {} switched to {}/{}/{}",
            user_id, update.method, update.protocol, update.obfs
        );
        Ok(())
    }
}
