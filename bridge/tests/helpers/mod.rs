//! Shared setup for the integration tests.
//!
//! The app runs on a bech32 mock API so that addresses derived from ed25519
//! keys are real, valid addresses. Keys are deterministic per seed.

#![allow(dead_code)]

use anyhow::Result as AnyResult;
use cosmwasm_std::{coins, to_json_binary, Addr, Binary, Empty, Uint128};
use cw20::{Cw20Coin, Cw20ExecuteMsg, MinterResponse};
use cw_multi_test::{
    no_init, App, AppBuilder, AppResponse, BankKeeper, Contract, ContractWrapper, Executor,
    MockAddressGenerator, MockApiBech32, WasmKeeper,
};
use ed25519_dalek::Signer;
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::elliptic_curve::sec1::ToEncodedPoint;

use common::AssetInfo;
use embedded_bridge::hash::{compute_administrator_proof_digest, compute_unwrap_digest};
use embedded_bridge::msg::{ExecuteMsg, InstantiateMsg, QueryMsg, ReceiveMsg};
use embedded_bridge::state::SecurityDelays;
use embedded_bridge::ContractError;

pub type BridgeApp = App<BankKeeper, MockApiBech32>;

pub const ADMINISTRATOR_DELAY: u64 = 30;
pub const SOFT_DELAY: u64 = 20;
pub const TSS_DELAY: u64 = 25;
pub const UNHALT_DURATION: u64 = 10;
pub const REDEEM_DELAY: u64 = 40;

pub const EVM_CLASS: u32 = 2;
pub const ETH_CHAIN_ID: u32 = 1;
pub const ETH_BRIDGE: &str = "0x1111111111111111111111111111111111111111";
pub const ETH_RECIPIENT: &str = "0x2222222222222222222222222222222222222222";
/// wZNN on the foreign network
pub const WZNN_ADDRESS: &str = "0xb2e96a63479c2edd2fd62b382c89d5ca79f572d3";
/// wQSR on the foreign network
pub const WQSR_ADDRESS: &str = "0x96546afe4a21515a3a30cd3fd64a70eb478dc174";

pub const QSR_DENOM: &str = "uqsr";
/// 1 ZNN with 8 decimals
pub const ZNN: u128 = 100_000_000;

// ============================================================================
// Keys
// ============================================================================

/// ed25519 key of the administrator or a guardian.
pub struct Ed25519Key {
    signing: ed25519_dalek::SigningKey,
}

impl Ed25519Key {
    pub fn new(seed: u8) -> Self {
        Self {
            signing: ed25519_dalek::SigningKey::from_bytes(&[seed; 32]),
        }
    }

    pub fn public(&self) -> Binary {
        Binary::from(self.signing.verifying_key().to_bytes().to_vec())
    }

    pub fn sign(&self, message: &[u8]) -> Binary {
        Binary::from(self.signing.sign(message).to_bytes().to_vec())
    }

    /// Address owned by this key
    pub fn owner(&self, app: &BridgeApp) -> Addr {
        embedded_bridge::address_codec::key_owner(app.api(), &self.public()).unwrap()
    }

    /// Proof of possession for `ChangeAdministratorKey`
    pub fn administrator_proof(&self, bridge: &Addr, proof_nonce: u64) -> Binary {
        let digest =
            compute_administrator_proof_digest(bridge.as_str(), proof_nonce, &self.public());
        self.sign(&digest)
    }
}

/// Stand-in for the orchestrators' threshold key.
pub struct TssSigner {
    signing: k256::ecdsa::SigningKey,
}

impl TssSigner {
    pub fn new(seed: u8) -> Self {
        Self {
            signing: k256::ecdsa::SigningKey::from_slice(&[seed; 32]).unwrap(),
        }
    }

    pub fn compressed(&self) -> Binary {
        let point = k256::PublicKey::from(self.signing.verifying_key()).to_encoded_point(true);
        Binary::from(point.as_bytes().to_vec())
    }

    pub fn decompressed(&self) -> Binary {
        let point = k256::PublicKey::from(self.signing.verifying_key()).to_encoded_point(false);
        Binary::from(point.as_bytes().to_vec())
    }

    pub fn sign(&self, digest: &[u8; 32]) -> Binary {
        let signature: k256::ecdsa::Signature = self.signing.sign_prehash(digest).unwrap();
        Binary::from(signature.to_bytes().to_vec())
    }
}

// ============================================================================
// Contracts
// ============================================================================

pub fn contract_bridge() -> Box<dyn Contract<Empty>> {
    let contract = ContractWrapper::new(
        embedded_bridge::contract::execute,
        embedded_bridge::contract::instantiate,
        embedded_bridge::contract::query,
    );
    Box::new(contract)
}

fn contract_cw20() -> Box<dyn Contract<Empty>> {
    let contract = ContractWrapper::new(
        cw20_base::contract::execute,
        cw20_base::contract::instantiate,
        cw20_base::contract::query,
    );
    Box::new(contract)
}

// ============================================================================
// Test Environment
// ============================================================================

pub struct TestEnv {
    pub app: BridgeApp,
    pub bridge: Addr,
    /// CW20 ZNN, minted and burned by the bridge
    pub znn: Addr,
    pub administrator: Ed25519Key,
    pub tss: TssSigner,
    pub user: Addr,
}

pub fn new_app() -> BridgeApp {
    AppBuilder::default()
        .with_api(MockApiBech32::new("terra"))
        .with_wasm(WasmKeeper::default().with_address_generator(MockAddressGenerator))
        .build(no_init)
}

pub fn default_delays() -> SecurityDelays {
    SecurityDelays {
        administrator_delay: ADMINISTRATOR_DELAY,
        soft_delay: SOFT_DELAY,
        tss_delay: TSS_DELAY,
    }
}

/// Bridge with administrator, delays and instantiation only.
pub fn setup_bare() -> TestEnv {
    let mut app = new_app();
    let administrator = Ed25519Key::new(1);
    let user = app.api().addr_make("user");
    let deployer = app.api().addr_make("deployer");

    let admin_addr = administrator.owner(&app);
    app.init_modules(|router, _, storage| {
        router
            .bank
            .init_balance(storage, &user, coins(1_000_000_000, QSR_DENOM))
            .unwrap();
        router
            .bank
            .init_balance(storage, &admin_addr, coins(1_000_000_000, QSR_DENOM))
            .unwrap();
    });

    let bridge_code = app.store_code(contract_bridge());
    let bridge = app
        .instantiate_contract(
            bridge_code,
            deployer.clone(),
            &InstantiateMsg {
                administrator: administrator.public(),
                delays: Some(default_delays()),
                unhalt_duration: Some(UNHALT_DURATION),
                metadata: None,
            },
            &[],
            "embedded-bridge",
            Some(deployer.to_string()),
        )
        .unwrap();

    let cw20_code = app.store_code(contract_cw20());
    let znn = app
        .instantiate_contract(
            cw20_code,
            deployer.clone(),
            &cw20_base::msg::InstantiateMsg {
                name: "Zenon".to_string(),
                symbol: "ZNN".to_string(),
                decimals: 8,
                initial_balances: vec![Cw20Coin {
                    address: user.to_string(),
                    amount: Uint128::from(1_000 * ZNN),
                }],
                mint: Some(MinterResponse {
                    minter: bridge.to_string(),
                    cap: None,
                }),
                marketing: None,
            },
            &[],
            "znn",
            None,
        )
        .unwrap();

    TestEnv {
        app,
        bridge,
        znn,
        administrator,
        tss: TssSigner::new(7),
        user,
    }
}

/// Fully configured bridge: TSS key installed, Ethereum network registered
/// with an owned ZNN pair (0.1% fee) and a custody QSR pair (1% fee).
pub fn setup() -> TestEnv {
    let mut env = setup_bare();

    let first_key = env.administrator_tss_change_msg(&env.tss, 3);
    env.commit_time_challenged(&first_key, TSS_DELAY);

    env.execute_as_admin(&ExecuteMsg::AddNetwork {
        network_class: EVM_CLASS,
        chain_id: ETH_CHAIN_ID,
        name: "Ethereum".to_string(),
        contract_address: ETH_BRIDGE.to_string(),
        metadata: "{}".to_string(),
    })
    .unwrap();

    let znn_pair = env.token_pair_msg(AssetInfo::cw20(env.znn.clone()), WZNN_ADDRESS, true, 10);
    env.commit_time_challenged(&znn_pair, SOFT_DELAY);
    let qsr_pair = env.token_pair_msg(AssetInfo::native(QSR_DENOM), WQSR_ADDRESS, false, 100);
    env.commit_time_challenged(&qsr_pair, SOFT_DELAY);

    env
}

impl TestEnv {
    pub fn admin_addr(&self) -> Addr {
        self.administrator.owner(&self.app)
    }

    pub fn height(&self) -> u64 {
        self.app.block_info().height
    }

    pub fn advance(&mut self, momentums: u64) {
        self.app.update_block(|block| {
            block.height += momentums;
            block.time = block.time.plus_seconds(10 * momentums);
        });
    }

    pub fn execute(&mut self, sender: &Addr, msg: &ExecuteMsg) -> AnyResult<AppResponse> {
        self.app
            .execute_contract(sender.clone(), self.bridge.clone(), msg, &[])
    }

    pub fn execute_as_admin(&mut self, msg: &ExecuteMsg) -> AnyResult<AppResponse> {
        let admin = self.admin_addr();
        self.execute(&admin, msg)
    }

    pub fn query<T: serde::de::DeserializeOwned>(&self, msg: &QueryMsg) -> T {
        self.app.wrap().query_wasm_smart(&self.bridge, msg).unwrap()
    }

    /// Propose `msg` as administrator, wait `delay` momentums, commit it.
    pub fn commit_time_challenged(&mut self, msg: &ExecuteMsg, delay: u64) {
        self.execute_as_admin(msg).unwrap();
        self.advance(delay);
        self.execute_as_admin(msg).unwrap();
    }

    pub fn token_pair_msg(
        &self,
        token_standard: AssetInfo,
        token_address: &str,
        owned: bool,
        fee_percentage: u32,
    ) -> ExecuteMsg {
        ExecuteMsg::SetTokenPair {
            network_class: EVM_CLASS,
            chain_id: ETH_CHAIN_ID,
            token_standard,
            token_address: token_address.to_string(),
            bridgeable: true,
            redeemable: true,
            owned,
            min_amount: Uint128::from(1_000u128),
            fee_percentage,
            redeem_delay: REDEEM_DELAY,
            metadata: String::new(),
        }
    }

    /// `ChangeTssKey` as sent by the administrator (time-challenged).
    pub fn administrator_tss_change_msg(&self, key: &TssSigner, threshold: u32) -> ExecuteMsg {
        ExecuteMsg::ChangeTssKey {
            pub_key: key.compressed(),
            old_key_signature: None,
            new_key_signature: None,
            key_sign_threshold: threshold,
        }
    }

    /// Install `self.tss` through the key-generation path. `old` signs the
    /// handover when a key is already set.
    pub fn install_tss_key_by_keygen(&mut self, old: Option<&TssSigner>) -> AnyResult<AppResponse> {
        let security: embedded_bridge::msg::SecurityInfoResponse =
            self.query(&QueryMsg::SecurityInfo {});
        let digest = embedded_bridge::hash::compute_tss_change_digest(
            self.bridge.as_str(),
            security.tss_nonce,
            &self.tss.decompressed(),
        );
        let relayer = self.app.api().addr_make("relayer");
        let msg = ExecuteMsg::ChangeTssKey {
            pub_key: self.tss.compressed(),
            old_key_signature: old.map(|key| key.sign(&digest)),
            new_key_signature: Some(self.tss.sign(&digest)),
            key_sign_threshold: 3,
        };
        self.execute(&relayer, &msg)
    }

    /// Nominate and commit guardians with the given key seeds.
    pub fn install_guardians(&mut self, seeds: &[u8]) -> Vec<Ed25519Key> {
        let guardians: Vec<Ed25519Key> = seeds.iter().map(|seed| Ed25519Key::new(*seed)).collect();
        let msg = ExecuteMsg::NominateGuardians {
            guardians: guardians.iter().map(|key| key.public()).collect(),
        };
        self.commit_time_challenged(&msg, SOFT_DELAY);
        guardians
    }

    /// Send `amount` ZNN from the user into a wrap request.
    pub fn wrap_znn(&mut self, amount: u128) -> AnyResult<AppResponse> {
        let msg = Cw20ExecuteMsg::Send {
            contract: self.bridge.to_string(),
            amount: Uint128::from(amount),
            msg: to_json_binary(&ReceiveMsg::WrapToken {
                network_class: EVM_CLASS,
                chain_id: ETH_CHAIN_ID,
                to_address: ETH_RECIPIENT.to_string(),
            })
            .unwrap(),
        };
        self.app
            .execute_contract(self.user.clone(), self.znn.clone(), &msg, &[])
    }

    /// Wrap `amount` of the native QSR denom.
    pub fn wrap_qsr(&mut self, amount: u128) -> AnyResult<AppResponse> {
        self.app.execute_contract(
            self.user.clone(),
            self.bridge.clone(),
            &ExecuteMsg::WrapToken {
                network_class: EVM_CLASS,
                chain_id: ETH_CHAIN_ID,
                to_address: ETH_RECIPIENT.to_string(),
            },
            &coins(amount, QSR_DENOM),
        )
    }

    /// `UnwrapToken` message for `transaction_hash`/`log_index`, signed by `self.tss`.
    pub fn unwrap_msg(
        &self,
        transaction_hash: [u8; 32],
        log_index: u32,
        token_address: &str,
        amount: u128,
    ) -> ExecuteMsg {
        let digest = compute_unwrap_digest(
            self.bridge.as_str(),
            EVM_CLASS,
            ETH_CHAIN_ID,
            &transaction_hash,
            log_index,
            self.user.as_str(),
            token_address,
            amount,
        );
        ExecuteMsg::UnwrapToken {
            network_class: EVM_CLASS,
            chain_id: ETH_CHAIN_ID,
            transaction_hash: Binary::from(transaction_hash.to_vec()),
            log_index,
            to_address: self.user.to_string(),
            token_address: token_address.to_string(),
            amount: Uint128::from(amount),
            signature: self.tss.sign(&digest),
        }
    }

    pub fn znn_balance(&self, address: &Addr) -> Uint128 {
        let response: cw20::BalanceResponse = self
            .app
            .wrap()
            .query_wasm_smart(
                &self.znn,
                &cw20::Cw20QueryMsg::Balance {
                    address: address.to_string(),
                },
            )
            .unwrap();
        response.balance
    }

    pub fn znn_supply(&self) -> Uint128 {
        let response: cw20::TokenInfoResponse = self
            .app
            .wrap()
            .query_wasm_smart(&self.znn, &cw20::Cw20QueryMsg::TokenInfo {})
            .unwrap();
        response.total_supply
    }

    pub fn qsr_balance(&self, address: &Addr) -> Uint128 {
        self.app
            .wrap()
            .query_balance(address, QSR_DENOM)
            .unwrap()
            .amount
    }
}

/// Assert that `result` failed with `expected`.
pub fn assert_contract_error(result: AnyResult<AppResponse>, expected: ContractError) {
    let err = result.unwrap_err();
    assert_eq!(err.root_cause().to_string(), expected.to_string());
}

/// Deterministic foreign transaction hash
pub fn tx_hash(seed: u8) -> [u8; 32] {
    [seed; 32]
}
