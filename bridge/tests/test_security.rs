//! Security registry: administrator and TSS key rotation, guardians, delays.

mod helpers;

use cosmwasm_std::Binary;
use cw_multi_test::Executor;

use embedded_bridge::hash::compute_tss_change_digest;
use embedded_bridge::msg::{ExecuteMsg, InstantiateMsg, QueryMsg, SecurityInfoResponse};
use embedded_bridge::state::{OrchestratorInfo, SecurityDelays};
use embedded_bridge::ContractError;
use helpers::*;

fn security(env: &TestEnv) -> SecurityInfoResponse {
    env.query(&QueryMsg::SecurityInfo {})
}

fn change_admin_msg(env: &TestEnv, new_key: &Ed25519Key) -> ExecuteMsg {
    let proof_nonce = security(env).proof_nonce;
    ExecuteMsg::ChangeAdministratorKey {
        new_key: new_key.public(),
        proof: new_key.administrator_proof(&env.bridge, proof_nonce),
    }
}

// ============================================================================
// Administrator Key
// ============================================================================

#[test]
fn test_administrator_rotation_waits_full_delay() {
    let mut env = setup();
    let new_admin = Ed25519Key::new(2);
    let msg = change_admin_msg(&env, &new_admin);

    env.execute_as_admin(&msg).unwrap();
    let info = security(&env);
    assert_eq!(info.requested_administrator, Some(new_admin.public()));
    assert_eq!(info.administrator_change_height, Some(env.height()));

    env.advance(ADMINISTRATOR_DELAY - 1);
    assert_contract_error(
        env.execute_as_admin(&msg),
        ContractError::TimeChallengeNotDue { remaining: 1 },
    );

    env.advance(1);
    env.execute_as_admin(&msg).unwrap();

    let info = security(&env);
    assert_eq!(info.administrator, Some(new_admin.public()));
    assert_eq!(info.requested_administrator, None);
    assert_eq!(info.proof_nonce, 1);
    assert_eq!(info.administrator_address, Some(new_admin.owner(&env.app)));

    // The old key lost its powers, the new one has them
    assert_contract_error(
        env.execute_as_admin(&ExecuteMsg::AllowKeygen {}),
        ContractError::PermissionDenied,
    );
    env.administrator = new_admin;
    env.execute_as_admin(&ExecuteMsg::AllowKeygen {}).unwrap();
}

#[test]
fn test_administrator_rotation_restarts_on_new_parameters() {
    let mut env = setup();
    let first = Ed25519Key::new(2);
    let second = Ed25519Key::new(3);
    let first_msg = change_admin_msg(&env, &first);
    let second_msg = change_admin_msg(&env, &second);

    env.execute_as_admin(&first_msg).unwrap();
    env.advance(20);

    // Different parameters replace the pending proposal
    env.execute_as_admin(&second_msg).unwrap();
    assert_eq!(security(&env).requested_administrator, Some(second.public()));

    env.advance(10);
    assert_contract_error(
        env.execute_as_admin(&second_msg),
        ContractError::TimeChallengeNotDue { remaining: 20 },
    );

    env.advance(20);
    env.execute_as_admin(&second_msg).unwrap();
    assert_eq!(security(&env).administrator, Some(second.public()));
}

#[test]
fn test_administrator_rotation_requires_proof_of_possession() {
    let mut env = setup();
    let new_admin = Ed25519Key::new(2);
    let impostor = Ed25519Key::new(3);

    let msg = ExecuteMsg::ChangeAdministratorKey {
        new_key: new_admin.public(),
        proof: impostor.administrator_proof(&env.bridge, 0),
    };
    assert_contract_error(env.execute_as_admin(&msg), ContractError::InvalidSignature);

    let msg = change_admin_msg(&env, &new_admin);
    let user = env.user.clone();
    assert_contract_error(env.execute(&user, &msg), ContractError::PermissionDenied);
}

#[test]
fn test_time_challenged_methods_need_delays() {
    let mut app = new_app();
    let administrator = Ed25519Key::new(1);
    let deployer = app.api().addr_make("deployer");
    let code_id = app.store_code(contract_bridge());
    let bridge = app
        .instantiate_contract(
            code_id,
            deployer,
            &InstantiateMsg {
                administrator: administrator.public(),
                delays: None,
                unhalt_duration: None,
                metadata: None,
            },
            &[],
            "embedded-bridge",
            None,
        )
        .unwrap();
    let admin = administrator.owner(&app);

    let new_admin = Ed25519Key::new(2);
    let msg = ExecuteMsg::ChangeAdministratorKey {
        new_key: new_admin.public(),
        proof: new_admin.administrator_proof(&bridge, 0),
    };
    let err = app
        .execute_contract(admin.clone(), bridge.clone(), &msg, &[])
        .unwrap_err();
    assert_eq!(
        err.root_cause().to_string(),
        ContractError::SecurityNotInitialized.to_string()
    );

    // The first delay configuration applies at once
    let delays = default_delays();
    let res = app
        .execute_contract(
            admin,
            bridge.clone(),
            &ExecuteMsg::SetSecurityDelays {
                administrator_delay: delays.administrator_delay,
                soft_delay: delays.soft_delay,
                tss_delay: delays.tss_delay,
            },
            &[],
        )
        .unwrap();
    assert!(res
        .events
        .iter()
        .any(|event| event.attributes.iter().any(|attr| attr.value == "applied")));

    let info: SecurityInfoResponse = app
        .wrap()
        .query_wasm_smart(&bridge, &QueryMsg::SecurityInfo {})
        .unwrap();
    assert_eq!(info.delays, Some(delays));
}

#[test]
fn test_instantiate_rejects_bad_administrator_key() {
    let mut app = new_app();
    let deployer = app.api().addr_make("deployer");
    let code_id = app.store_code(contract_bridge());

    let err = app
        .instantiate_contract(
            code_id,
            deployer,
            &InstantiateMsg {
                administrator: Binary::from(vec![0u8; 32]),
                delays: Some(default_delays()),
                unhalt_duration: None,
                metadata: None,
            },
            &[],
            "embedded-bridge",
            None,
        )
        .unwrap_err();
    assert!(err.root_cause().to_string().contains("zero key"));
}

// ============================================================================
// Security Delays
// ============================================================================

#[test]
fn test_security_delays_change_is_time_challenged() {
    let mut env = setup();
    let msg = ExecuteMsg::SetSecurityDelays {
        administrator_delay: 40,
        soft_delay: 10,
        tss_delay: 15,
    };

    env.execute_as_admin(&msg).unwrap();
    assert_eq!(security(&env).delays, Some(default_delays()));

    env.advance(ADMINISTRATOR_DELAY);
    env.execute_as_admin(&msg).unwrap();
    assert_eq!(
        security(&env).delays,
        Some(SecurityDelays {
            administrator_delay: 40,
            soft_delay: 10,
            tss_delay: 15,
        })
    );
}

#[test]
fn test_security_delays_minimums() {
    let mut env = setup();

    let err = env
        .execute_as_admin(&ExecuteMsg::SetSecurityDelays {
            administrator_delay: 1,
            soft_delay: 20,
            tss_delay: 25,
        })
        .unwrap_err();
    assert!(err.root_cause().to_string().contains("administrator delay"));

    let err = env
        .execute_as_admin(&ExecuteMsg::SetSecurityDelays {
            administrator_delay: 30,
            soft_delay: 1,
            tss_delay: 25,
        })
        .unwrap_err();
    assert!(err.root_cause().to_string().contains("soft and TSS delays"));
}

// ============================================================================
// TSS Key
// ============================================================================

#[test]
fn test_first_tss_key_installed_by_administrator() {
    let env = setup();
    let info = security(&env);

    assert_eq!(
        info.tss_key.map(|key| key.compressed),
        Some(env.tss.compressed())
    );
    assert_eq!(info.requested_tss_key, None);
    assert_eq!(info.key_sign_threshold, 3);
    assert_eq!(info.tss_nonce, 1);
    assert!(!info.allow_key_gen);
}

#[test]
fn test_keygen_cannot_install_first_key() {
    let mut env = setup_bare();
    env.execute_as_admin(&ExecuteMsg::AllowKeygen {}).unwrap();

    // A self-signed key from an arbitrary caller
    env.tss = TssSigner::new(66);
    assert_contract_error(
        env.install_tss_key_by_keygen(None),
        ContractError::PermissionDenied,
    );

    let info = security(&env);
    assert_eq!(info.tss_key, None);
    assert_eq!(info.tss_nonce, 0);
    assert!(info.allow_key_gen);

    // Without a TSS key nothing can be registered for redemption
    let msg = env.unwrap_msg(tx_hash(1), 0, WZNN_ADDRESS, 1_000_000 * ZNN);
    let attacker = env.app.api().addr_make("attacker");
    assert_contract_error(
        env.execute(&attacker, &msg),
        ContractError::BridgeNotInitialized,
    );
}

#[test]
fn test_keygen_requires_open_window() {
    let mut env = setup();
    let old = std::mem::replace(&mut env.tss, TssSigner::new(8));

    assert_contract_error(
        env.install_tss_key_by_keygen(Some(&old)),
        ContractError::PermissionDenied,
    );

    env.execute_as_admin(&ExecuteMsg::AllowKeygen {}).unwrap();
    env.install_tss_key_by_keygen(Some(&old)).unwrap();

    let info = security(&env);
    assert_eq!(
        info.tss_key.map(|key| key.decompressed),
        Some(env.tss.decompressed())
    );
    assert_eq!(info.tss_nonce, 2);
}

#[test]
fn test_keygen_rotation_needs_outgoing_key_signature() {
    let mut env = setup();
    env.execute_as_admin(&ExecuteMsg::AllowKeygen {}).unwrap();
    let old = std::mem::replace(&mut env.tss, TssSigner::new(8));

    // Missing handover signature
    assert_contract_error(
        env.install_tss_key_by_keygen(None),
        ContractError::InvalidSignature,
    );

    // Handover signed by a key that is not the current one
    let stranger = TssSigner::new(9);
    assert_contract_error(
        env.install_tss_key_by_keygen(Some(&stranger)),
        ContractError::InvalidSignature,
    );

    env.install_tss_key_by_keygen(Some(&old)).unwrap();
}

#[test]
fn test_keygen_rejects_signature_from_wrong_new_key() {
    let mut env = setup();
    env.execute_as_admin(&ExecuteMsg::AllowKeygen {}).unwrap();

    let next = TssSigner::new(8);
    let digest = compute_tss_change_digest(env.bridge.as_str(), 1, &next.decompressed());
    let relayer = env.app.api().addr_make("relayer");
    let msg = ExecuteMsg::ChangeTssKey {
        pub_key: next.compressed(),
        old_key_signature: Some(env.tss.sign(&digest)),
        new_key_signature: Some(TssSigner::new(9).sign(&digest)),
        key_sign_threshold: 3,
    };
    assert_contract_error(env.execute(&relayer, &msg), ContractError::InvalidSignature);
}

#[test]
fn test_administrator_tss_rotation_uses_tss_delay() {
    let mut env = setup();
    let next = TssSigner::new(8);
    let msg = ExecuteMsg::ChangeTssKey {
        pub_key: next.compressed(),
        old_key_signature: None,
        new_key_signature: None,
        key_sign_threshold: 4,
    };

    env.execute_as_admin(&msg).unwrap();
    let info = security(&env);
    assert_eq!(
        info.requested_tss_key.map(|proposal| proposal.key.compressed),
        Some(next.compressed())
    );

    env.advance(TSS_DELAY - 1);
    assert_contract_error(
        env.execute_as_admin(&msg),
        ContractError::TimeChallengeNotDue { remaining: 1 },
    );

    env.advance(1);
    env.execute_as_admin(&msg).unwrap();
    let info = security(&env);
    assert_eq!(
        info.tss_key.map(|key| key.compressed),
        Some(next.compressed())
    );
    assert_eq!(info.key_sign_threshold, 4);
    assert_eq!(info.tss_nonce, 2);
}

#[test]
fn test_tss_key_must_be_valid_point() {
    let mut env = setup();
    let msg = ExecuteMsg::ChangeTssKey {
        pub_key: Binary::from(vec![2u8; 10]),
        old_key_signature: None,
        new_key_signature: None,
        key_sign_threshold: 3,
    };
    let err = env.execute_as_admin(&msg).unwrap_err();
    assert!(err.root_cause().to_string().contains("secp256k1"));

    let msg = ExecuteMsg::ChangeTssKey {
        pub_key: TssSigner::new(8).compressed(),
        old_key_signature: None,
        new_key_signature: None,
        key_sign_threshold: 0,
    };
    let err = env.execute_as_admin(&msg).unwrap_err();
    assert!(err.root_cause().to_string().contains("threshold"));
}

// ============================================================================
// Guardians
// ============================================================================

#[test]
fn test_guardian_nomination() {
    let mut env = setup();
    let guardians = env.install_guardians(&[10, 11, 12, 13, 14]);

    let info = security(&env);
    assert_eq!(
        info.guardians,
        guardians.iter().map(|key| key.public()).collect::<Vec<_>>()
    );
    assert_eq!(info.guardian_votes, vec![None; 5]);
    assert!(info.nominated_guardians.is_empty());
}

#[test]
fn test_guardian_nomination_validation() {
    let mut env = setup();

    let too_few = ExecuteMsg::NominateGuardians {
        guardians: (10..14).map(|seed| Ed25519Key::new(seed).public()).collect(),
    };
    let err = env.execute_as_admin(&too_few).unwrap_err();
    assert!(err.root_cause().to_string().contains("at least 5 guardians"));

    let mut keys: Vec<Binary> = (10..14).map(|seed| Ed25519Key::new(seed).public()).collect();
    keys.push(keys[0].clone());
    let duplicate = ExecuteMsg::NominateGuardians { guardians: keys };
    let err = env.execute_as_admin(&duplicate).unwrap_err();
    assert!(err.root_cause().to_string().contains("duplicate guardian"));
}

// ============================================================================
// Orchestrator / Bridge Metadata
// ============================================================================

#[test]
fn test_orchestrator_info() {
    let mut env = setup();
    env.execute_as_admin(&ExecuteMsg::SetOrchestratorInfo {
        window_size: 50,
        key_gen_threshold: 3,
        confirmations_to_finality: 6,
        estimated_momentum_time: 10,
    })
    .unwrap();

    let info: OrchestratorInfo = env.query(&QueryMsg::OrchestratorInfo {});
    assert_eq!(info.window_size, 50);
    assert_eq!(info.key_gen_threshold, 3);
    assert_eq!(info.confirmations_to_finality, 6);
    assert_eq!(info.estimated_momentum_time, 10);

    let err = env
        .execute_as_admin(&ExecuteMsg::SetOrchestratorInfo {
            window_size: 0,
            key_gen_threshold: 3,
            confirmations_to_finality: 6,
            estimated_momentum_time: 10,
        })
        .unwrap_err();
    assert!(err.root_cause().to_string().contains("must be positive"));
}

#[test]
fn test_bridge_metadata() {
    let mut env = setup();
    env.execute_as_admin(&ExecuteMsg::SetBridgeMetadata {
        metadata: r#"{"name":"testnet"}"#.to_string(),
    })
    .unwrap();

    let info: embedded_bridge::msg::BridgeInfoResponse = env.query(&QueryMsg::BridgeInfo {});
    assert_eq!(info.metadata, r#"{"name":"testnet"}"#);

    let err = env
        .execute_as_admin(&ExecuteMsg::SetBridgeMetadata {
            metadata: "x".repeat(5000),
        })
        .unwrap_err();
    assert!(err.root_cause().to_string().contains("metadata exceeds"));
}
