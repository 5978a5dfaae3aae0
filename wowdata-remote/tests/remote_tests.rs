use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use wowdata_channel::{Handled, RegistrationError, Tier};
use wowdata_model::{EntityType, Record};
use wowdata_remote::signing::{api_path, auth_headers, signature};
use wowdata_remote::url::build_url;
use wowdata_remote::{
    ApiChannel, AuthOptions, RemoteError, RemoteOptions, RemoteResult, RemoteScheme, Transport,
    UrlParam, default_base_paths, default_remote_schemes,
};
use wowdata_types::{ParamGroup, Value};

const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];

/// Serves canned bodies by URL and remembers every request.
struct FakeTransport {
    bodies: BTreeMap<String, Vec<u8>>,
    requests: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl FakeTransport {
    fn serving(bodies: &[(&str, &[u8])]) -> Arc<Self> {
        Arc::new(Self {
            bodies: bodies
                .iter()
                .map(|(url, body)| (url.to_string(), body.to_vec()))
                .collect(),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.requests.lock().unwrap().clone()
    }
}

struct Shared(Arc<FakeTransport>);

impl Transport for Shared {
    fn get(&self, url: &str, headers: &[(String, String)]) -> RemoteResult<Vec<u8>> {
        self.0
            .requests
            .lock()
            .unwrap()
            .push((url.to_string(), headers.to_vec()));
        self.0
            .bodies
            .get(url)
            .cloned()
            .ok_or_else(|| RemoteError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

fn channel(transport: &Arc<FakeTransport>) -> ApiChannel {
    ApiChannel::with_transport(RemoteOptions::default(), Box::new(Shared(Arc::clone(transport))))
        .unwrap()
}

fn group(pairs: &[(&str, Value)]) -> ParamGroup {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn eu(pairs: &[(&str, Value)]) -> ParamGroup {
    let mut params = group(&[
        ("locale", Value::from("de_DE")),
        ("region", Value::from("eu")),
        ("realm", Value::from("gilneas")),
    ]);
    params.extend(group(pairs));
    params
}

fn url(entity: EntityType, params: &ParamGroup) -> String {
    build_url(&default_base_paths(), &default_remote_schemes()[&entity], params).unwrap()
}

// ── URLs ─────────────────────────────────────────────────────────

#[test]
fn realm_status_url_carries_the_realm_as_query() {
    assert_eq!(
        url(EntityType::Realm, &eu(&[])),
        "http://eu.battle.net/api/wow/realm/status?realm=gilneas"
    );
}

#[test]
fn character_url_uses_default_fields() {
    let params = eu(&[
        ("realm", Value::from("Die Nachtwache")),
        ("character", Value::from("Thrall")),
    ]);
    assert_eq!(
        url(EntityType::Character, &params),
        "http://eu.battle.net/api/wow/character/die-nachtwache/thrall?fields=stats,talents,items"
    );
}

#[test]
fn unknown_field_names_are_filtered() {
    let params = eu(&[
        ("character", Value::from("Thrall")),
        (
            "fields",
            Value::List(vec![Value::from("items"), Value::from("secrets")]),
        ),
    ]);
    assert_eq!(
        url(EntityType::Character, &params),
        "http://eu.battle.net/api/wow/character/gilneas/thrall?fields=items"
    );
}

#[test]
fn missing_mandatory_parameter_is_an_error() {
    let err = build_url(
        &default_base_paths(),
        &default_remote_schemes()[&EntityType::Item],
        &eu(&[]),
    )
    .unwrap_err();
    assert!(matches!(err, RemoteError::Url(_)));
}

#[test]
fn unknown_region_falls_back_to_the_first_region() {
    let params = eu(&[("region", Value::from("xx")), ("itemid", Value::from(19019))]);
    assert_eq!(url(EntityType::Item, &params), "http://us.battle.net/api/wow/item/19019");
}

#[test]
fn china_has_its_own_host() {
    let params = eu(&[("region", Value::from("cn")), ("itemid", Value::from(19019))]);
    assert_eq!(url(EntityType::Item, &params), "http://battlenet.com.cn/api/wow/item/19019");
}

#[test]
fn asset_urls_replace_the_api_base() {
    let params = eu(&[("icon", Value::from("INV_Sword_39"))]);
    assert_eq!(
        url(EntityType::Icon, &params),
        "http://eu.battle.net/wow-assets/static/images/icons/56/inv_sword_39.jpg"
    );
    let params = eu(&[("filename", Value::from("gilneas/12/3456-avatar.jpg"))]);
    assert_eq!(
        url(EntityType::CharacterThumbnail, &params),
        "http://eu.battle.net/static-render/eu/gilneas/12/3456-avatar.jpg"
    );
}

#[test]
fn lists_without_separator_repeat_the_key() {
    let scheme = RemoteScheme {
        enabled: true,
        base_path: BTreeMap::new(),
        ext_path: "search?type=item".into(),
        params: BTreeMap::from([("tag".to_string(), UrlParam::optional())]),
    };
    let params = group(&[(
        "tag",
        Value::List(vec![Value::from("epic"), Value::from("sword")]),
    )]);
    assert_eq!(
        build_url(&default_base_paths(), &scheme, &params).unwrap(),
        "http://us.battle.net/api/wow/search?type=item&tag=epic&tag=sword"
    );
}

// ── Signing ──────────────────────────────────────────────────────

fn auth() -> AuthOptions {
    AuthOptions {
        directive: "BNET".into(),
        public_key: "pub".into(),
        private_key: "secret".into(),
    }
}

#[test]
fn signature_is_hmac_sha1_over_method_date_and_path() {
    assert_eq!(
        signature(&auth(), "Tue, 01 Nov 2011 10:00:00 +0000", "/api/wow/item/19019").unwrap(),
        "BNET pub:n+sEIJjQV0voNdkHllRoQv3oUPo="
    );
}

#[test]
fn api_path_starts_at_the_api_prefix() {
    assert_eq!(
        api_path("http://eu.battle.net/api/wow/realm/status?realm=gilneas"),
        "/api/wow/realm/status?realm=gilneas"
    );
    assert_eq!(api_path("http://example.org/icon.jpg"), "http://example.org/icon.jpg");
}

#[test]
fn auth_headers_sign_the_rfc2822_date() {
    let now = Utc.with_ymd_and_hms(2011, 11, 15, 10, 0, 0).unwrap();
    let headers = auth_headers(
        &auth(),
        "http://eu.battle.net/api/wow/realm/status?realm=gilneas",
        now,
    )
    .unwrap();
    assert_eq!(
        headers,
        vec![
            ("Date".to_string(), "Tue, 15 Nov 2011 10:00:00 +0000".to_string()),
            (
                "Authorization".to_string(),
                "BNET pub:c1xJa16BlD1HjoO0Yhgl0ehzRpA=".to_string()
            ),
        ]
    );
}

// ── Channel ──────────────────────────────────────────────────────

const REALM_STATUS: &str = r#"{"realms":[{"type":"pvp","queue":false,"status":true,"population":"high","name":"Gilneas","slug":"gilneas"}]}"#;

#[test]
fn realm_payload_maps_onto_a_valid_record() {
    let transport = FakeTransport::serving(&[(
        "http://eu.battle.net/api/wow/realm/status?realm=gilneas",
        REALM_STATUS.as_bytes(),
    )]);
    let found = channel(&transport).read(EntityType::Realm, &[eu(&[])]).into_vec();
    assert_eq!(found.len(), 1);
    assert!(found[0].is_valid());
    assert_eq!(found[0].get("region"), Some(&Value::from("eu")));
    assert_eq!(found[0].get("population"), Some(&Value::from("high")));
}

#[test]
fn realm_status_with_several_realms_is_a_miss() {
    let body = r#"{"realms":[{"name":"Gilneas","slug":"gilneas"},{"name":"Antonidas","slug":"antonidas"}]}"#;
    let transport = FakeTransport::serving(&[(
        "http://eu.battle.net/api/wow/realm/status?realm=gilneas",
        body.as_bytes(),
    )]);
    assert_eq!(
        channel(&transport).read(EntityType::Realm, &[eu(&[])]),
        Handled::Done(Vec::new())
    );
}

#[test]
fn character_payload_takes_location_from_the_group() {
    let body = r#"{"name":"Thrall","realm":"Gilneas","class":7,"race":2,"gender":0,"level":85,"achievementPoints":4200,"thumbnail":"gilneas/12/3456-avatar.jpg"}"#;
    let transport = FakeTransport::serving(&[(
        "http://eu.battle.net/api/wow/character/gilneas/thrall?fields=stats,talents,items",
        body.as_bytes(),
    )]);
    let params = eu(&[("character", Value::from("Thrall"))]);
    let found = channel(&transport)
        .read(EntityType::Character, &[params.clone()])
        .into_vec();
    assert_eq!(found.len(), 1);
    let thrall = &found[0];
    assert!(thrall.is_valid());
    assert_eq!(thrall.get("realm"), Some(&Value::from("gilneas")));
    assert_eq!(thrall.get("classid"), Some(&Value::Int(7)));
    assert_eq!(thrall.get("genderid"), Some(&Value::Int(0)));
    assert!(thrall.match_params(&params));
}

#[test]
fn item_payload_maps_renamed_keys() {
    let body = r#"{"id":19019,"name":"Thunderfury, Blessed Blade of the Windseeker","icon":"inv_sword_39","quality":5,"itemBind":1,"itemClass":2,"itemLevel":80,"requiredLevel":60,"weaponInfo":{"damage":{"min":44,"max":84},"weaponSpeed":1.9,"dps":33.68}}"#;
    let transport = FakeTransport::serving(&[(
        "http://eu.battle.net/api/wow/item/19019",
        body.as_bytes(),
    )]);
    let params = eu(&[("itemid", Value::from(19019))]);
    let found = channel(&transport).read(EntityType::Item, &[params]).into_vec();
    assert_eq!(found.len(), 1);
    let item = &found[0];
    assert!(item.is_valid());
    assert_eq!(item.get("overallQualityId"), Some(&Value::Int(5)));
    assert_eq!(item.get("classId"), Some(&Value::Int(2)));
    assert_eq!(item.get("bonding"), Some(&Value::Int(1)));
    assert_eq!(item.get("locale"), Some(&Value::from("de_DE")));
}

#[test]
fn icon_body_becomes_the_image() {
    let transport = FakeTransport::serving(&[(
        "http://eu.battle.net/wow-assets/static/images/icons/56/inv_sword_39.jpg",
        JPEG,
    )]);
    let params = eu(&[("icon", Value::from("inv_sword_39"))]);
    let found = channel(&transport).read(EntityType::Icon, &[params]).into_vec();
    let expected = Record::from_values(
        EntityType::Icon,
        [
            ("region", Value::from("eu")),
            ("icon", Value::from("inv_sword_39")),
            ("image", Value::bytes(JPEG)),
        ],
    );
    assert_eq!(found, vec![expected]);
}

#[test]
fn transport_failure_is_a_miss() {
    let transport = FakeTransport::serving(&[]);
    assert_eq!(
        channel(&transport).read(EntityType::Realm, &[eu(&[])]),
        Handled::Done(Vec::new())
    );
    assert_eq!(transport.requests().len(), 1);
}

#[test]
fn malformed_json_is_a_miss() {
    let transport = FakeTransport::serving(&[(
        "http://eu.battle.net/api/wow/realm/status?realm=gilneas",
        &b"<html>maintenance</html>"[..],
    )]);
    assert!(channel(&transport)
        .read(EntityType::Realm, &[eu(&[])])
        .into_vec()
        .is_empty());
}

#[test]
fn remote_tier_never_writes() {
    let transport = FakeTransport::serving(&[]);
    let channel = channel(&transport);
    assert_eq!(channel.write(EntityType::Realm, &[]), Handled::Refused);
    assert!(!channel.is_enabled(EntityType::ItemEquipped));
    assert_eq!(
        channel.read(EntityType::ItemEquipped, &[eu(&[])]),
        Handled::Refused
    );
}

#[test]
fn signed_channel_sends_auth_headers() {
    let transport = FakeTransport::serving(&[(
        "http://eu.battle.net/api/wow/realm/status?realm=gilneas",
        REALM_STATUS.as_bytes(),
    )]);
    let options = RemoteOptions {
        auth: Some(auth()),
        ..RemoteOptions::default()
    };
    let channel =
        ApiChannel::with_transport(options, Box::new(Shared(Arc::clone(&transport)))).unwrap();
    channel.read(EntityType::Realm, &[eu(&[])]);

    let requests = transport.requests();
    let (_, headers) = &requests[0];
    let names: Vec<&str> = headers.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["Date", "Authorization"]);
    assert!(headers[1].1.starts_with("BNET pub:"));
}

// ── Options ──────────────────────────────────────────────────────

#[test]
fn empty_private_key_is_rejected() {
    let options = RemoteOptions {
        auth: Some(AuthOptions {
            private_key: " ".into(),
            ..auth()
        }),
        ..RemoteOptions::default()
    };
    let err = ApiChannel::with_transport(options, Box::new(Shared(FakeTransport::serving(&[]))))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        RemoteError::Registration(RegistrationError::MissingOption(_))
    ));
    assert_eq!(err.code(), 500);
}

#[test]
fn options_parse_from_toml() {
    let options: RemoteOptions = toml::from_str(
        r#"
        timeout_secs = 5

        [auth]
        public_key = "pub"
        private_key = "secret"

        [base_paths]
        eu = "https://eu.api.example.org/wow/"

        [schemes.guild]
        enabled = false
        "#,
    )
    .unwrap();
    assert_eq!(options.connect_timeout_secs, 4);
    assert_eq!(options.timeout_secs, 5);
    assert_eq!(options.auth.as_ref().map(|a| a.directive.as_str()), Some("BNET"));

    let channel =
        ApiChannel::with_transport(options, Box::new(Shared(FakeTransport::serving(&[])))).unwrap();
    assert!(!channel.is_enabled(EntityType::Guild));
    assert_eq!(
        channel
            .url_for(EntityType::Item, &eu(&[("itemid", Value::from(19019))]))
            .unwrap(),
        "https://eu.api.example.org/wow/item/19019"
    );
}
