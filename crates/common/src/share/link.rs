use std::fmt;

use url::Url;

use super::ShareError;
use crate::crypto::ShareSecret;
use crate::ledger::RecordId;

const FRAGMENT_KEY: &str = "key=";

/// A share URL; the secret lives only in the `#key=` fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareLink {
    /// `{base}/share/{record_id}#key={secret}`
    Record {
        record_id: RecordId,
        secret: ShareSecret,
    },
    /// `{base}/s/{address}#key={secret}`
    Package {
        address: String,
        secret: ShareSecret,
    },
}

impl ShareLink {
    pub fn secret(&self) -> &ShareSecret {
        match self {
            ShareLink::Record { secret, .. } | ShareLink::Package { secret, .. } => secret,
        }
    }

    pub fn to_url(&self, base: &Url) -> Result<Url, ShareError> {
        let mut url = base.clone();
        url.set_query(None);
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ShareError::InvalidLink(format!("{base} cannot be a base url")))?;
            segments.pop_if_empty();
            match self {
                ShareLink::Record { record_id, .. } => {
                    let id = record_id.to_string();
                    segments.extend(["share", id.as_str()]);
                }
                ShareLink::Package { address, .. } => {
                    segments.extend(["s", address.as_str()]);
                }
            }
        }
        url.set_fragment(Some(&format!("{}{}", FRAGMENT_KEY, self.secret().as_str())));
        Ok(url)
    }

    pub fn parse(link: &str) -> Result<Self, ShareError> {
        let url = Url::parse(link.trim()).map_err(|e| ShareError::InvalidLink(e.to_string()))?;

        let secret = url
            .fragment()
            .and_then(|fragment| {
                fragment
                    .split('&')
                    .find_map(|pair| pair.strip_prefix(FRAGMENT_KEY))
            })
            .ok_or_else(|| ShareError::InvalidLink("missing #key= fragment".to_string()))?;
        let secret = ShareSecret::parse(secret)?;

        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        match segments.as_slice() {
            [.., "share", id] => {
                let record_id = id
                    .parse()
                    .map_err(|_| ShareError::InvalidLink(format!("bad record id {id:?}")))?;
                Ok(ShareLink::Record { record_id, secret })
            }
            [.., "s", address] => Ok(ShareLink::Package {
                address: address.to_string(),
                secret,
            }),
            _ => Err(ShareError::InvalidLink(format!(
                "unrecognized share path {}",
                url.path()
            ))),
        }
    }
}

impl fmt::Display for ShareLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShareLink::Record { record_id, .. } => write!(f, "share/{}", record_id),
            ShareLink::Package { address, .. } => write!(f, "s/{}", address),
        }
    }
}
