//! Biometric Hardware Keyring
//!
//! [`BiometricKeyring`] wraps a [`DeviceService`] and owns its session state.
//! The derivation path is resolved once at construction (or restore) and
//! every device call reuses it.
//!
//! Overlapping sign calls against one physical device are not serialized
//! here; callers must issue them one at a time.

use super::snapshot::KeyringSnapshot;
use super::state::SessionState;
use super::Keyring;
use crate::config::KeyringOptions;
use crate::device::{self, DeviceService, PopupGuard, TypedDataPayload};
use crate::error::{KeyringError, KeyringResult};
use crate::tx::{decode_signed_transaction, SignedTransaction, SigningRequest, TransactionInput};
use crate::types::{AccountEntry, TypedDataOptions, DEVICE_MODEL, KEYRING_TYPE};
use crate::utils::redact_address;
use crate::wallet::{checksum_address, normalize_address, same_address, CoinType, DerivationPath};
use async_trait::async_trait;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Keyring backed by a biometric hardware device
pub struct BiometricKeyring<D: DeviceService> {
    device: D,
    timeout: Duration,
    state: RwLock<SessionState>,
}

impl<D: DeviceService> BiometricKeyring<D> {
    /// Build a keyring from construction options.
    ///
    /// Fails with [`KeyringError::UnsupportedPath`] if the template's coin
    /// type is not recognized.
    pub fn new(device: D, options: KeyringOptions) -> KeyringResult<Self> {
        let state = SessionState::new(
            &options.path_template,
            options.accounts,
            options.cached_addresses,
        )?;
        debug!(path = %state.path, coin_type = %state.coin_type, "keyring created");
        Ok(Self {
            device,
            timeout: options.timeout,
            state: RwLock::new(state),
        })
    }

    /// Rebuild a keyring from a snapshot without contacting the device
    pub fn from_snapshot(device: D, snapshot: &KeyringSnapshot, timeout: Duration) -> KeyringResult<Self> {
        Ok(Self {
            device,
            timeout,
            state: RwLock::new(snapshot.restore()?),
        })
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn model(&self) -> &'static str {
        DEVICE_MODEL
    }

    pub fn derivation_path(&self) -> DerivationPath {
        self.read().path
    }

    /// Resolved path as sent to the device
    pub fn path(&self) -> String {
        self.read().path.to_string()
    }

    pub fn coin_type(&self) -> CoinType {
        self.read().coin_type
    }

    pub fn path_template(&self) -> String {
        self.read().path_template.clone()
    }

    pub fn set_account_to_unlock(&self, index: u32) {
        self.write().unlocked_account = index;
    }

    pub fn unlocked_account(&self) -> u32 {
        self.read().unlocked_account
    }

    pub fn page(&self) -> u32 {
        self.read().page
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn device_target(&self) -> (CoinType, String) {
        let state = self.read();
        (state.coin_type, state.path.to_string())
    }

    async fn single_account_page(&self) -> KeyringResult<Vec<AccountEntry>> {
        self.write().page = 1;
        self.unlock().await?;
        Ok(self.read().account_page())
    }
}

/// Fail unless the device-reported signer is the requested address
fn verify_signer(expected: &str, actual: &str) -> KeyringResult<()> {
    if same_address(expected, actual) {
        return Ok(());
    }
    warn!(
        expected = %redact_address(expected),
        actual = %redact_address(actual),
        "device signed with a different address"
    );
    Err(KeyringError::mismatch(expected, actual))
}

#[async_trait]
impl<D: DeviceService> Keyring for BiometricKeyring<D> {
    fn keyring_type(&self) -> &'static str {
        KEYRING_TYPE
    }

    fn is_unlocked(&self) -> bool {
        self.read().is_unlocked()
    }

    async fn unlock(&self) -> KeyringResult<String> {
        let cached = self.read().cached_address().map(str::to_string);
        if let Some(address) = cached {
            return Ok(address);
        }

        let (coin_type, path) = self.device_target();
        let _popup = PopupGuard::new(&self.device);
        let parameter = device::settle(
            "getAddress",
            self.timeout,
            self.device.get_address(coin_type, &path),
        )
        .await?;

        info!(address = %redact_address(&parameter.address), %path, "keyring unlocked");
        self.write().cache_address(&parameter.address);
        Ok(parameter.address)
    }

    async fn add_accounts(&self, n: usize) -> KeyringResult<Vec<String>> {
        if n > 1 {
            debug!(requested = n, "only one account is supported");
        }
        let address = self.unlock().await?;
        let mut state = self.write();
        state.accounts = vec![address];
        state.page = 0;
        Ok(state.accounts.clone())
    }

    async fn get_first_page(&self) -> KeyringResult<Vec<AccountEntry>> {
        self.write().page = 0;
        self.single_account_page().await
    }

    async fn get_next_page(&self) -> KeyringResult<Vec<AccountEntry>> {
        self.single_account_page().await
    }

    async fn get_previous_page(&self) -> KeyringResult<Vec<AccountEntry>> {
        self.single_account_page().await
    }

    fn get_accounts(&self) -> Vec<String> {
        self.read().accounts.clone()
    }

    fn remove_account(&self, address: &str) -> KeyringResult<()> {
        self.write().remove_account(address)
    }

    async fn sign_transaction(
        &self,
        address: &str,
        tx: TransactionInput,
    ) -> KeyringResult<SignedTransaction> {
        let expected = normalize_address(address)?;
        let tx = match tx {
            TransactionInput::Legacy(mut legacy) => {
                legacy.prepare_for_signing();
                TransactionInput::Legacy(legacy)
            }
            typed => typed,
        };
        let request = SigningRequest::from_input(&tx);

        self.unlock().await?;
        let (coin_type, path) = self.device_target();
        debug!(tx_type = %request.tx_type, chain_id = request.chain_id, %path, "signing transaction");

        let _popup = PopupGuard::new(&self.device);
        let parameter = device::settle(
            "getSignedTransaction",
            self.timeout,
            self.device.get_signed_transaction(coin_type, &request, &path),
        )
        .await?;

        let decoded = decode_signed_transaction(&parameter.signed)?;
        verify_signer(&expected, &checksum_address(&decoded.sender))?;

        match tx {
            TransactionInput::Legacy(legacy) => SignedTransaction::legacy_with_signature(
                legacy,
                &parameter.sign_v,
                &parameter.sign_r,
                &parameter.sign_s,
            ),
            TransactionInput::Typed(_) => Ok(SignedTransaction::Typed(Box::new(decoded.transaction))),
        }
    }

    async fn sign_personal_message(&self, address: &str, message: &str) -> KeyringResult<String> {
        let expected = normalize_address(address)?;
        self.unlock().await?;
        let (_, path) = self.device_target();
        debug!(message_len = message.len(), %path, "signing personal message");

        let _popup = PopupGuard::new(&self.device);
        let parameter = device::settle(
            "getSignedMessage",
            self.timeout,
            self.device.get_signed_message(message, &path),
        )
        .await?;

        verify_signer(&expected, &parameter.address)?;
        Ok(parameter.signature)
    }

    async fn sign_typed_data(
        &self,
        address: &str,
        typed_data: serde_json::Value,
        options: TypedDataOptions,
    ) -> KeyringResult<String> {
        let expected = normalize_address(address)?;
        self.unlock().await?;
        let (_, path) = self.device_target();
        debug!(version = %options.version, %path, "signing typed data");

        let payload = TypedDataPayload {
            payload: typed_data,
            version: options.version,
        };
        let _popup = PopupGuard::new(&self.device);
        let parameter = device::settle(
            "getSignedData",
            self.timeout,
            self.device.get_signed_data(&path, &payload),
        )
        .await?;

        verify_signer(&expected, &parameter.address)?;
        Ok(parameter.signature)
    }

    async fn export_account(&self, _address: &str) -> KeyringResult<String> {
        Err(KeyringError::UnsupportedOperation("exportAccount".to_string()))
    }

    fn serialize(&self) -> KeyringSnapshot {
        KeyringSnapshot::capture(&self.read())
    }

    fn deserialize(&self, snapshot: &KeyringSnapshot) -> KeyringResult<()> {
        let restored = snapshot.restore()?;
        *self.write() = restored;
        Ok(())
    }

    fn forget(&self) {
        self.write().clear();
        info!("keyring forgotten");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{
        AddressParameter, DeviceFailure, DeviceResponse, DeviceResult, SignatureParameter,
        SignedTransactionParameter,
    };
    use crate::tx::{ChainConfig, LegacyTransaction, TxType, TypedTransactionInput};
    use crate::types::SignTypedDataVersion;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const DEVICE_ADDR: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
    const OTHER_ADDR: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

    /// Fake device answering from canned responses and counting calls
    struct ScriptedDevice {
        address: Mutex<DeviceResult<AddressParameter>>,
        signed_tx: Mutex<DeviceResult<SignedTransactionParameter>>,
        signature: Mutex<DeviceResult<SignatureParameter>>,
        hang: bool,
        address_calls: AtomicUsize,
        popups: AtomicUsize,
        last_request: Mutex<Option<SigningRequest>>,
        last_payload: Mutex<Option<TypedDataPayload>>,
    }

    impl ScriptedDevice {
        fn new() -> Self {
            Self {
                address: Mutex::new(Ok(DeviceResponse::success(AddressParameter {
                    address: DEVICE_ADDR.to_string(),
                }))),
                signed_tx: Mutex::new(Ok(DeviceResponse::error("user_cancel", "canceled by user"))),
                signature: Mutex::new(Ok(DeviceResponse::success(SignatureParameter {
                    address: DEVICE_ADDR.to_string(),
                    signature: "0xsig".to_string(),
                }))),
                hang: false,
                address_calls: AtomicUsize::new(0),
                popups: AtomicUsize::new(0),
                last_request: Mutex::new(None),
                last_payload: Mutex::new(None),
            }
        }

        fn hanging() -> Self {
            Self {
                hang: true,
                ..Self::new()
            }
        }

        fn address_calls(&self) -> usize {
            self.address_calls.load(Ordering::SeqCst)
        }

        fn popups(&self) -> usize {
            self.popups.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DeviceService for ScriptedDevice {
        async fn get_address(&self, _: CoinType, _: &str) -> DeviceResult<AddressParameter> {
            self.address_calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            self.address.lock().unwrap().clone()
        }

        async fn get_signed_transaction(
            &self,
            _: CoinType,
            request: &SigningRequest,
            _: &str,
        ) -> DeviceResult<SignedTransactionParameter> {
            *self.last_request.lock().unwrap() = Some(request.clone());
            self.signed_tx.lock().unwrap().clone()
        }

        async fn get_signed_message(&self, _: &str, _: &str) -> DeviceResult<SignatureParameter> {
            self.signature.lock().unwrap().clone()
        }

        async fn get_signed_data(
            &self,
            _: &str,
            data: &TypedDataPayload,
        ) -> DeviceResult<SignatureParameter> {
            *self.last_payload.lock().unwrap() = Some(data.clone());
            self.signature.lock().unwrap().clone()
        }

        fn close_popup(&self) {
            self.popups.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn keyring(device: ScriptedDevice) -> BiometricKeyring<ScriptedDevice> {
        BiometricKeyring::new(device, KeyringOptions::default()).unwrap()
    }

    fn typed_input(nonce: &str, value: &str) -> TransactionInput {
        TransactionInput::Typed(TypedTransactionInput {
            tx_type: TxType::FeeMarket,
            nonce: nonce.to_string(),
            gas_price: None,
            gas_limit: "0x5208".to_string(),
            to: Some(OTHER_ADDR.to_string()),
            value: value.to_string(),
            data: "0x".to_string(),
            access_list: None,
            max_priority_fee_per_gas: Some("0x3b9aca00".to_string()),
            max_fee_per_gas: Some("0x77359400".to_string()),
            common: ChainConfig { chain_id: 1 },
        })
    }

    #[test]
    fn test_construction_rejects_unknown_coin() {
        let options = KeyringOptions::default().with_path_template("m/44'/999'/0'/0/0");
        let err = BiometricKeyring::new(ScriptedDevice::new(), options).err().unwrap();
        assert!(matches!(err, KeyringError::UnsupportedPath(_)));
    }

    #[test]
    fn test_identification() {
        let keyring = keyring(ScriptedDevice::new());
        assert_eq!(keyring.keyring_type(), "Biometric Hardware");
        assert_eq!(keyring.model(), "Biometric Wallet");
        assert_eq!(keyring.path(), "m/44'/60'/0'/0/0");
        assert_eq!(keyring.coin_type(), CoinType::Ethereum);
    }

    #[tokio::test]
    async fn test_unlock_is_idempotent() {
        let keyring = keyring(ScriptedDevice::new());
        assert!(!keyring.is_unlocked());

        assert_eq!(keyring.unlock().await.unwrap(), DEVICE_ADDR);
        assert_eq!(keyring.unlock().await.unwrap(), DEVICE_ADDR);

        assert!(keyring.is_unlocked());
        assert_eq!(keyring.device().address_calls(), 1);
        assert_eq!(keyring.device().popups(), 1);
    }

    #[tokio::test]
    async fn test_forget_relocks() {
        let keyring = keyring(ScriptedDevice::new());
        keyring.add_accounts(1).await.unwrap();
        keyring.set_account_to_unlock(2);

        keyring.forget();
        assert!(!keyring.is_unlocked());
        assert!(keyring.get_accounts().is_empty());
        assert_eq!(keyring.unlocked_account(), 0);

        keyring.unlock().await.unwrap();
        assert_eq!(keyring.device().address_calls(), 2);
    }

    #[tokio::test]
    async fn test_unlock_failure_closes_popup() {
        let device = ScriptedDevice::new();
        *device.address.lock().unwrap() = Err(DeviceFailure::Reported(
            crate::device::DeviceErrorBody::new("pin_failed", "fingerprint not recognized"),
        ));
        let keyring = keyring(device);

        let err = keyring.unlock().await.unwrap_err();
        assert_eq!(err.to_string(), "pin_failed - fingerprint not recognized");
        assert!(!keyring.is_unlocked());
        assert_eq!(keyring.device().popups(), 1);
    }

    #[tokio::test]
    async fn test_unlock_times_out() {
        let options = KeyringOptions::default().with_timeout(Duration::from_millis(20));
        let keyring = BiometricKeyring::new(ScriptedDevice::hanging(), options).unwrap();

        let err = keyring.unlock().await.unwrap_err();
        assert_eq!(err, KeyringError::DeviceTimeout(Duration::from_millis(20)));
        assert_eq!(keyring.device().popups(), 1);
        assert!(!keyring.is_unlocked());
    }

    #[tokio::test]
    async fn test_accounts_and_pages() {
        let keyring = keyring(ScriptedDevice::new());

        let accounts = keyring.add_accounts(3).await.unwrap();
        assert_eq!(accounts, vec![DEVICE_ADDR.to_string()]);
        assert_eq!(keyring.page(), 0);

        let expected = vec![AccountEntry::new(DEVICE_ADDR, 0)];
        assert_eq!(keyring.get_first_page().await.unwrap(), expected);
        assert_eq!(keyring.page(), 1);
        assert_eq!(keyring.get_next_page().await.unwrap(), expected);
        assert_eq!(keyring.get_previous_page().await.unwrap(), expected);
        assert_eq!(keyring.device().address_calls(), 1);
    }

    #[tokio::test]
    async fn test_remove_account() {
        let keyring = keyring(ScriptedDevice::new());
        keyring.add_accounts(1).await.unwrap();

        let err = keyring.remove_account(OTHER_ADDR).unwrap_err();
        assert!(matches!(err, KeyringError::AddressNotFound(_)));

        keyring.remove_account(&DEVICE_ADDR.to_uppercase().replace("0X", "0x")).unwrap();
        assert!(keyring.get_accounts().is_empty());
    }

    #[tokio::test]
    async fn test_personal_message_mismatch_is_hard_failure() {
        let keyring = keyring(ScriptedDevice::new());
        let err = keyring.sign_personal_message(OTHER_ADDR, "0x68656c6c6f").await.unwrap_err();
        assert!(matches!(err, KeyringError::SignatureMismatch { .. }));
        // unlock popup + signing popup
        assert_eq!(keyring.device().popups(), 2);
    }

    #[tokio::test]
    async fn test_sign_message_aliases_personal_message() {
        let keyring = keyring(ScriptedDevice::new());
        let lower = DEVICE_ADDR.to_lowercase();
        assert_eq!(keyring.sign_message(&lower, "hello").await.unwrap(), "0xsig");
        assert_eq!(keyring.sign_personal_message(&lower, "hello").await.unwrap(), "0xsig");
        assert_eq!(keyring.device().address_calls(), 1);
    }

    #[tokio::test]
    async fn test_typed_data_forwards_version() {
        let keyring = keyring(ScriptedDevice::new());
        let data = serde_json::json!({"primaryType": "Mail", "message": {"contents": "hi"}});
        let signature = keyring
            .sign_typed_data(DEVICE_ADDR, data.clone(), TypedDataOptions::new(SignTypedDataVersion::V3))
            .await
            .unwrap();
        assert_eq!(signature, "0xsig");

        let payload = keyring.device().last_payload.lock().unwrap().clone().unwrap();
        assert_eq!(payload.payload, data);
        assert_eq!(payload.version, SignTypedDataVersion::V3);
    }

    #[tokio::test]
    async fn test_message_error_without_details() {
        let device = ScriptedDevice::new();
        *device.signature.lock().unwrap() = Ok(DeviceResponse::bare_error());
        let keyring = keyring(device);

        let err = keyring.sign_personal_message(DEVICE_ADDR, "hi").await.unwrap_err();
        assert!(matches!(err, KeyringError::UnknownDevice(_)));
        assert_eq!(keyring.device().popups(), 2);
    }

    #[tokio::test]
    async fn test_typed_request_normalizes_bare_quantities() {
        let keyring = keyring(ScriptedDevice::new());
        let err = keyring
            .sign_transaction(DEVICE_ADDR, typed_input("0x", "0x"))
            .await
            .unwrap_err();
        assert_eq!(err, KeyringError::device("user_cancel", "canceled by user"));

        let request = keyring.device().last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.nonce, "0x0");
        assert_eq!(request.value, "0x0");
        assert_eq!(request.tx_type, TxType::FeeMarket);
        assert_eq!(request.options.max_fee_per_gas.as_deref(), Some("0x77359400"));
        assert_eq!(keyring.device().popups(), 2);
    }

    #[tokio::test]
    async fn test_legacy_request_carries_chain_id() {
        let keyring = keyring(ScriptedDevice::new());
        let legacy = LegacyTransaction::new(56).with_gas_limit(21_000);
        keyring
            .sign_transaction(DEVICE_ADDR, TransactionInput::Legacy(legacy))
            .await
            .unwrap_err();

        let request = keyring.device().last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.chain_id, 56);
        assert_eq!(request.nonce, "0x0");
        assert_eq!(request.gas_limit, "0x5208");
        assert!(request.options.is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_signed_payload() {
        let device = ScriptedDevice::new();
        *device.signed_tx.lock().unwrap() = Ok(DeviceResponse::success(SignedTransactionParameter {
            signed: "zz".to_string(),
            sign_v: "0x25".to_string(),
            sign_r: "0x01".to_string(),
            sign_s: "0x01".to_string(),
        }));
        let keyring = keyring(device);

        let err = keyring
            .sign_transaction(DEVICE_ADDR, typed_input("0x1", "0x0"))
            .await
            .unwrap_err();
        assert!(matches!(err, KeyringError::InvalidTransaction(_)));
        assert_eq!(keyring.device().popups(), 2);
    }

    #[tokio::test]
    async fn test_invalid_address_argument() {
        let keyring = keyring(ScriptedDevice::new());
        let err = keyring.sign_personal_message("not-an-address", "hi").await.unwrap_err();
        assert!(matches!(err, KeyringError::InvalidAddress(_)));
        assert_eq!(keyring.device().address_calls(), 0);
    }

    #[tokio::test]
    async fn test_export_account_unsupported() {
        let keyring = keyring(ScriptedDevice::new());
        let err = keyring.export_account(DEVICE_ADDR).await.unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::UnsupportedOperation);
    }

    #[tokio::test]
    async fn test_serialize_round_trip_without_device() {
        let keyring = keyring(ScriptedDevice::new());
        keyring.add_accounts(1).await.unwrap();
        let snapshot = keyring.serialize();
        assert_eq!(snapshot.cached_addresses, vec![DEVICE_ADDR.to_string()]);

        let restored =
            BiometricKeyring::from_snapshot(ScriptedDevice::new(), &snapshot, Duration::from_secs(1)).unwrap();
        assert!(restored.is_unlocked());
        assert_eq!(restored.unlock().await.unwrap(), DEVICE_ADDR);
        assert_eq!(restored.device().address_calls(), 0);
        assert_eq!(restored.serialize(), snapshot);
    }

    #[test]
    fn test_deserialize_replaces_state() {
        let keyring = keyring(ScriptedDevice::new());
        let snapshot = KeyringSnapshot {
            accounts: vec![DEVICE_ADDR.to_string()],
            cached_addresses: vec![DEVICE_ADDR.to_string()],
            path_template: "m/44'/137'/0'/0/0".to_string(),
            unlocked_account_index: 0,
        };
        keyring.deserialize(&snapshot).unwrap();
        assert_eq!(keyring.coin_type(), CoinType::Rsk);
        assert!(keyring.is_unlocked());
        assert_eq!(keyring.get_accounts(), vec![DEVICE_ADDR.to_string()]);
    }
}
