//! Sharing-link parameter encoding.
//!
//! A link is a URL over the application base with the share parameters in
//! the query string. File links carry the key itself (the key is the
//! shared secret); folder links carry the shared-folder keystore binding
//! so the recipient's client can pull the whole key set.

use crate::error::{SharingError, SharingResult};
use podlock_crypto::SymmetricKey;
use std::collections::HashMap;
use url::Url;

const PARAM_FILE: &str = "file";
const PARAM_KEY: &str = "key";
const PARAM_GROUP: &str = "group";
const PARAM_FOLDER: &str = "folder";
const PARAM_KEYSTORE: &str = "keystore";
const PARAM_KEYSTORE_KEY: &str = "keystoreEncryptionKey";

/// Parameters of a sharing link.
#[derive(Clone, Debug)]
pub enum SharingLink {
    /// Direct key sharing for a single file.
    File {
        file: Url,
        key: SymmetricKey,
        group: Url,
    },
    /// Keystore-binding sharing for a folder subtree.
    Folder {
        folder: Url,
        group: Url,
        keystore: Url,
        keystore_key: SymmetricKey,
    },
}

impl SharingLink {
    /// The resource this link shares.
    pub fn target(&self) -> &Url {
        match self {
            SharingLink::File { file, .. } => file,
            SharingLink::Folder { folder, .. } => folder,
        }
    }

    /// The access-control group backing this link.
    pub fn group(&self) -> &Url {
        match self {
            SharingLink::File { group, .. } => group,
            SharingLink::Folder { group, .. } => group,
        }
    }

    /// Composes the link URL over the application base.
    pub fn to_url(&self, base: &Url) -> Url {
        let mut link = base.clone();
        {
            let mut pairs = link.query_pairs_mut();
            pairs.clear();
            match self {
                SharingLink::File { file, key, group } => {
                    pairs.append_pair(PARAM_FILE, file.as_str());
                    pairs.append_pair(PARAM_KEY, &key.to_base64());
                    pairs.append_pair(PARAM_GROUP, group.as_str());
                }
                SharingLink::Folder {
                    folder,
                    group,
                    keystore,
                    keystore_key,
                } => {
                    pairs.append_pair(PARAM_FOLDER, folder.as_str());
                    pairs.append_pair(PARAM_GROUP, group.as_str());
                    pairs.append_pair(PARAM_KEYSTORE, keystore.as_str());
                    pairs.append_pair(PARAM_KEYSTORE_KEY, &keystore_key.to_base64());
                }
            }
        }
        link
    }

    /// Parses a link URL back into its parameters.
    pub fn parse(link: &Url) -> SharingResult<Self> {
        let params: HashMap<String, String> = link
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if params.contains_key(PARAM_FILE) {
            Ok(SharingLink::File {
                file: param_url(&params, PARAM_FILE)?,
                key: param_key(&params, PARAM_KEY)?,
                group: param_url(&params, PARAM_GROUP)?,
            })
        } else if params.contains_key(PARAM_FOLDER) {
            Ok(SharingLink::Folder {
                folder: param_url(&params, PARAM_FOLDER)?,
                group: param_url(&params, PARAM_GROUP)?,
                keystore: param_url(&params, PARAM_KEYSTORE)?,
                keystore_key: param_key(&params, PARAM_KEYSTORE_KEY)?,
            })
        } else {
            Err(SharingError::InvalidLink(format!(
                "neither a file nor a folder link: {link}"
            )))
        }
    }
}

fn param<'a>(params: &'a HashMap<String, String>, name: &str) -> SharingResult<&'a str> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| SharingError::InvalidLink(format!("missing parameter {name}")))
}

fn param_url(params: &HashMap<String, String>, name: &str) -> SharingResult<Url> {
    Url::parse(param(params, name)?)
        .map_err(|e| SharingError::InvalidLink(format!("bad url in parameter {name}: {e}")))
}

fn param_key(params: &HashMap<String, String>, name: &str) -> SharingResult<SymmetricKey> {
    SymmetricKey::from_base64(param(params, name)?)
        .map_err(|e| SharingError::InvalidLink(format!("bad key in parameter {name}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://app.podlock.dev/share").unwrap()
    }

    #[test]
    fn file_link_roundtrip() {
        let link = SharingLink::File {
            file: Url::parse("https://pod/alice/crypto/a.txt").unwrap(),
            key: SymmetricKey::generate(),
            group: Url::parse("https://pod/alice/groups/g1").unwrap(),
        };
        let url = link.to_url(&base());
        let parsed = SharingLink::parse(&url).unwrap();
        match (link, parsed) {
            (
                SharingLink::File { file, key, group },
                SharingLink::File {
                    file: f2,
                    key: k2,
                    group: g2,
                },
            ) => {
                assert_eq!(file, f2);
                assert_eq!(key, k2);
                assert_eq!(group, g2);
            }
            _ => panic!("expected file links"),
        }
    }

    #[test]
    fn folder_link_roundtrip() {
        let link = SharingLink::Folder {
            folder: Url::parse("https://pod/alice/crypto/shared/").unwrap(),
            group: Url::parse("https://pod/alice/groups/g2").unwrap(),
            keystore: Url::parse("https://pod/alice/keystores/k.keystore.enc").unwrap(),
            keystore_key: SymmetricKey::generate(),
        };
        let url = link.to_url(&base());
        assert!(url.as_str().contains("keystoreEncryptionKey="));
        let parsed = SharingLink::parse(&url).unwrap();
        assert_eq!(parsed.target(), link.target());
        assert_eq!(parsed.group(), link.group());
    }

    #[test]
    fn parse_rejects_bare_url() {
        let result = SharingLink::parse(&base());
        assert!(matches!(result, Err(SharingError::InvalidLink(_))));
    }

    #[test]
    fn parse_rejects_missing_key() {
        let mut url = base();
        url.query_pairs_mut()
            .append_pair("file", "https://pod/alice/crypto/a.txt")
            .append_pair("group", "https://pod/alice/groups/g1");
        assert!(matches!(
            SharingLink::parse(&url),
            Err(SharingError::InvalidLink(_))
        ));
    }
}
