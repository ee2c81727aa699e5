//! An in-memory [`Host`]: accounts in a map, journaled per nested call.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use primitive_types::{H256, U256};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{parse_h160, parse_hex, parse_u256, to_hex};
use crate::error::{EvmError, StatusCode};
use crate::host::{keccak256, Address, CallAction, CallKind, ExecutionResult, Host, Message, StorageStatus, TxContext};
use crate::memory::num_words;

/// Address of the identity precompile.
pub const IDENTITY: u64 = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageSlot {
    pub value: U256,
    /// Written during the current transaction.
    pub dirty: bool,
}

impl StorageSlot {
    pub fn new(value: U256) -> Self {
        Self { value, dirty: false }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Account {
    pub nonce: u64,
    pub balance: U256,
    pub code: Vec<u8>,
    pub storage: HashMap<U256, StorageSlot>,
}

impl Account {
    pub fn storage_value(&self, key: &U256) -> U256 {
        self.storage.get(key).map(|s| s.value).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct World {
    pub accounts: HashMap<Address, Account>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WorldJson {
    #[serde(default)]
    accounts: BTreeMap<String, AccountJson>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AccountJson {
    #[serde(default)]
    nonce: u64,
    #[serde(default)]
    balance: String,
    #[serde(default)]
    code: String,
    #[serde(default)]
    storage: BTreeMap<String, String>,
}

fn parse_amount(s: &str) -> Result<U256, EvmError> {
    if s.trim().is_empty() {
        return Ok(U256::zero());
    }
    parse_u256(s)
}

impl World {
    /// Parses `{"accounts": {"0x..": {nonce, balance, code, storage}}}`.
    pub fn from_json(text: &str) -> Result<World, EvmError> {
        let parsed: WorldJson = serde_json::from_str(text)?;
        let mut world = World::default();
        for (key, acc) in parsed.accounts {
            let addr = parse_h160(&key)?;
            let mut account = Account {
                nonce: acc.nonce,
                balance: parse_amount(&acc.balance)?,
                code: parse_hex(&acc.code)?,
                storage: HashMap::new(),
            };
            for (k, v) in acc.storage {
                account.storage.insert(parse_u256(&k)?, StorageSlot::new(parse_u256(&v)?));
            }
            world.accounts.insert(addr, account);
        }
        Ok(world)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<World, EvmError> {
        let text = std::fs::read_to_string(path)?;
        World::from_json(&text)
    }

    /// Pretty JSON in the format [`World::from_json`] reads. Zero storage
    /// slots are left out.
    pub fn to_json(&self) -> Result<String, EvmError> {
        let mut out = WorldJson::default();
        for (addr, acc) in &self.accounts {
            let storage = acc
                .storage
                .iter()
                .filter(|(_, slot)| !slot.value.is_zero())
                .map(|(k, slot)| (format!("0x{:x}", k), format!("0x{:x}", slot.value)))
                .collect();
            out.accounts.insert(
                format!("0x{}", to_hex(addr.as_bytes())),
                AccountJson {
                    nonce: acc.nonce,
                    balance: format!("0x{:x}", acc.balance),
                    code: format!("0x{}", to_hex(&acc.code)),
                    storage,
                },
            );
        }
        Ok(serde_json::to_string_pretty(&out)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<H256>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
struct Snapshot {
    accounts: HashMap<Address, Account>,
    logs: usize,
    selfdestructs: usize,
}

/// Host over a [`World`]. Each nested call snapshots the world; the
/// snapshot is dropped when the call succeeds and restored otherwise.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHost {
    pub world: World,
    pub tx: TxContext,
    pub logs: Vec<LogEntry>,
    /// (account, beneficiary) pairs in execution order.
    pub selfdestructs: Vec<(Address, Address)>,
    pub block_hashes: HashMap<u64, H256>,
    journal: Vec<Snapshot>,
}

impl InMemoryHost {
    pub fn new(world: World, tx: TxContext) -> Self {
        Self { world, tx, ..Default::default() }
    }

    fn snapshot(&mut self) {
        self.journal.push(Snapshot {
            accounts: self.world.accounts.clone(),
            logs: self.logs.len(),
            selfdestructs: self.selfdestructs.len(),
        });
    }

    fn restore(&mut self, snap: Snapshot) {
        self.world.accounts = snap.accounts;
        self.logs.truncate(snap.logs);
        self.selfdestructs.truncate(snap.selfdestructs);
    }

    /// Opens the journal entry for a top-level frame.
    pub fn begin_transaction(&mut self) {
        self.snapshot();
    }

    /// Closes the entry opened by [`begin_transaction`](Self::begin_transaction).
    /// A failed frame leaves no trace; a successful one is committed and its
    /// storage slots count as clean for the next transaction.
    pub fn end_transaction(&mut self, status: StatusCode) {
        let Some(snap) = self.journal.pop() else {
            return;
        };
        if !status.is_success() {
            self.restore(snap);
            return;
        }
        for slot in self.world.accounts.values_mut().flat_map(|a| a.storage.values_mut()) {
            slot.dirty = false;
        }
    }

    fn transfer(&mut self, from: Address, to: Address, value: U256) -> bool {
        if value.is_zero() {
            return true;
        }
        let sender = self.world.accounts.entry(from).or_default();
        if sender.balance < value {
            return false;
        }
        sender.balance -= value;
        let recipient = self.world.accounts.entry(to).or_default();
        recipient.balance = recipient.balance.overflowing_add(value).0;
        true
    }

    fn begin_create(&mut self, msg: &Message) -> CallAction {
        let sender = self.world.accounts.entry(msg.sender).or_default();
        let nonce = sender.nonce;
        sender.nonce = nonce.saturating_add(1);
        let addr = match msg.kind {
            CallKind::Create2 => create2_address(msg.sender, msg.create2_salt, &msg.input),
            _ => create_address(msg.sender, nonce),
        };

        let collision =
            self.world.accounts.get(&addr).is_some_and(|a| a.nonce != 0 || !a.code.is_empty());
        if collision {
            debug!(address = ?addr, "create collision");
            return CallAction::Done(ExecutionResult::failure(StatusCode::Failure));
        }
        if !self.transfer(msg.sender, addr, msg.value) {
            return CallAction::Done(ExecutionResult::failure(StatusCode::Failure));
        }
        self.world.accounts.entry(addr).or_default();

        let mut child = msg.clone();
        child.destination = addr;
        child.code_address = addr;
        let code = std::mem::take(&mut child.input);
        CallAction::Execute { msg: child, code }
    }
}

fn identity(msg: &Message) -> ExecutionResult {
    let cost = 15 + 3 * num_words(msg.input.len() as u64);
    if msg.gas < cost {
        return ExecutionResult::failure(StatusCode::OutOfGas);
    }
    ExecutionResult::new(StatusCode::Success, msg.gas - cost, msg.input.clone())
}

impl Host for InMemoryHost {
    fn account_exists(&self, addr: &Address) -> bool {
        self.world.accounts.contains_key(addr)
    }

    fn get_storage(&self, addr: &Address, key: &U256) -> U256 {
        self.world.accounts.get(addr).map(|a| a.storage_value(key)).unwrap_or_default()
    }

    fn set_storage(&mut self, addr: &Address, key: &U256, value: U256) -> StorageStatus {
        let slot = self.world.accounts.entry(*addr).or_default().storage.entry(*key).or_default();
        if slot.value == value {
            return StorageStatus::Unchanged;
        }
        let status = if slot.dirty {
            StorageStatus::ModifiedAgain
        } else {
            slot.dirty = true;
            if slot.value.is_zero() {
                StorageStatus::Added
            } else if !value.is_zero() {
                StorageStatus::Modified
            } else {
                StorageStatus::Deleted
            }
        };
        slot.value = value;
        status
    }

    fn get_balance(&self, addr: &Address) -> U256 {
        self.world.accounts.get(addr).map(|a| a.balance).unwrap_or_default()
    }

    fn get_code_size(&self, addr: &Address) -> usize {
        self.world.accounts.get(addr).map(|a| a.code.len()).unwrap_or(0)
    }

    fn get_code_hash(&self, addr: &Address) -> H256 {
        self.world.accounts.get(addr).map(|a| keccak256(&a.code)).unwrap_or_default()
    }

    fn copy_code(&self, addr: &Address, offset: usize, buf: &mut [u8]) -> usize {
        let code = match self.world.accounts.get(addr) {
            Some(a) if offset < a.code.len() => &a.code[offset..],
            _ => return 0,
        };
        let n = code.len().min(buf.len());
        buf[..n].copy_from_slice(&code[..n]);
        n
    }

    fn selfdestruct(&mut self, addr: &Address, beneficiary: &Address) {
        let balance = self.get_balance(addr);
        if addr != beneficiary {
            self.transfer(*addr, *beneficiary, balance);
        }
        self.selfdestructs.push((*addr, *beneficiary));
    }

    fn call(&mut self, msg: &Message) -> CallAction {
        self.snapshot();
        if msg.kind.is_create() {
            return self.begin_create(msg);
        }
        if msg.kind == CallKind::Call && !self.transfer(msg.sender, msg.destination, msg.value) {
            return CallAction::Done(ExecutionResult::failure(StatusCode::Failure));
        }
        if msg.code_address == Address::from_low_u64_be(IDENTITY) {
            return CallAction::Done(identity(msg));
        }
        let code = self.world.accounts.get(&msg.code_address).map(|a| a.code.clone()).unwrap_or_default();
        if code.is_empty() {
            return CallAction::Done(ExecutionResult::new(StatusCode::Success, msg.gas, Vec::new()));
        }
        CallAction::Execute { msg: msg.clone(), code }
    }

    fn finish_call(&mut self, msg: &Message, mut result: ExecutionResult) -> ExecutionResult {
        let snapshot = self.journal.pop();
        if !result.status.is_success() {
            if let Some(snap) = snapshot {
                self.restore(snap);
            }
            return result;
        }
        if msg.kind.is_create() {
            self.world.accounts.entry(msg.destination).or_default().code = result.output().to_vec();
            result.create_address = Some(msg.destination);
            result.set_output(Vec::new());
        }
        result
    }

    fn get_tx_context(&self) -> TxContext {
        self.tx.clone()
    }

    fn get_block_hash(&self, number: u64) -> H256 {
        self.block_hashes.get(&number).copied().unwrap_or_default()
    }

    fn emit_log(&mut self, addr: &Address, data: &[u8], topics: &[H256]) {
        self.logs.push(LogEntry { address: *addr, topics: topics.to_vec(), data: data.to_vec() });
    }
}

fn rlp_bytes(b: &[u8]) -> Vec<u8> {
    if b.len() == 1 && b[0] < 0x80 {
        return vec![b[0]];
    }
    let mut out = Vec::with_capacity(b.len() + 1);
    out.push(0x80 + b.len() as u8);
    out.extend_from_slice(b);
    out
}

fn rlp_u64(n: u64) -> Vec<u8> {
    let be = n.to_be_bytes();
    let first = be.iter().position(|&b| b != 0).unwrap_or(be.len());
    rlp_bytes(&be[first..])
}

/// CREATE address: `keccak(rlp([sender, nonce]))[12..]`.
pub fn create_address(sender: Address, nonce: u64) -> Address {
    let enc_sender = rlp_bytes(sender.as_bytes());
    let enc_nonce = rlp_u64(nonce);
    let mut rlp = Vec::with_capacity(1 + enc_sender.len() + enc_nonce.len());
    rlp.push(0xc0 + (enc_sender.len() + enc_nonce.len()) as u8);
    rlp.extend_from_slice(&enc_sender);
    rlp.extend_from_slice(&enc_nonce);
    Address::from_slice(&keccak256(&rlp).as_bytes()[12..])
}

/// CREATE2 address: `keccak(0xff ++ sender ++ salt ++ keccak(init))[12..]`.
pub fn create2_address(sender: Address, salt: U256, init_code: &[u8]) -> Address {
    let mut buf = Vec::with_capacity(85);
    buf.push(0xff);
    buf.extend_from_slice(sender.as_bytes());
    let mut salt_bytes = [0u8; 32];
    salt.to_big_endian(&mut salt_bytes);
    buf.extend_from_slice(&salt_bytes);
    buf.extend_from_slice(keccak256(init_code).as_bytes());
    Address::from_slice(&keccak256(&buf).as_bytes()[12..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    #[test]
    fn storage_status_transitions() {
        let mut host = InMemoryHost::default();
        let a = addr(1);
        let k = U256::one();
        assert_eq!(host.set_storage(&a, &k, U256::zero()), StorageStatus::Unchanged);
        assert_eq!(host.set_storage(&a, &k, U256::from(5)), StorageStatus::Added);
        assert_eq!(host.set_storage(&a, &k, U256::from(6)), StorageStatus::ModifiedAgain);
        assert_eq!(host.get_storage(&a, &k), U256::from(6));

        let mut world = World::default();
        let mut acc = Account::default();
        acc.storage.insert(k, StorageSlot::new(U256::from(9)));
        world.accounts.insert(a, acc);
        let mut host = InMemoryHost::new(world.clone(), TxContext::default());
        assert_eq!(host.set_storage(&a, &k, U256::from(1)), StorageStatus::Modified);
        let mut host = InMemoryHost::new(world, TxContext::default());
        assert_eq!(host.set_storage(&a, &k, U256::zero()), StorageStatus::Deleted);
    }

    #[test]
    fn create_addresses() {
        // Well-known vector: sender 0x6ac7ea33f8831ea9dcc53393aaa88b25a785dbf0.
        let sender = parse_h160("0x6ac7ea33f8831ea9dcc53393aaa88b25a785dbf0").unwrap();
        assert_eq!(
            create_address(sender, 0),
            parse_h160("0xcd234a471b72ba2f1ccf0a70fcaba648a5eecd8d").unwrap()
        );
        assert_eq!(
            create_address(sender, 1),
            parse_h160("0x343c43a37d37dff08ae8c4a11544c718abb4fcf8").unwrap()
        );
        // EIP-1014 example 0.
        assert_eq!(
            create2_address(Address::zero(), U256::zero(), &[0x00]),
            parse_h160("0x4d1a2e2bb4f88f0250f26ffff098b0b30b26bf38").unwrap()
        );
    }

    #[test]
    fn failed_call_rolls_back() {
        let mut world = World::default();
        world.accounts.insert(addr(1), Account { balance: U256::from(100), ..Default::default() });
        let mut host = InMemoryHost::new(world, TxContext::default());
        let msg = Message {
            kind: CallKind::Call,
            gas: 1000,
            sender: addr(1),
            destination: addr(2),
            code_address: addr(2),
            value: U256::from(40),
            ..Default::default()
        };
        match host.call(&msg) {
            CallAction::Done(r) => assert!(r.status.is_success()),
            CallAction::Execute { .. } => panic!("empty account executes nothing"),
        }
        assert_eq!(host.get_balance(&addr(2)), U256::from(40));
        let r = host.finish_call(&msg, ExecutionResult::failure(StatusCode::Revert));
        assert_eq!(r.status, StatusCode::Revert);
        assert_eq!(host.get_balance(&addr(1)), U256::from(100));
        assert_eq!(host.get_balance(&addr(2)), U256::zero());
    }

    #[test]
    fn identity_precompile() {
        let mut host = InMemoryHost::default();
        let msg = Message { gas: 100, code_address: addr(IDENTITY), input: vec![1, 2, 3], ..Default::default() };
        match host.call(&msg) {
            CallAction::Done(r) => {
                assert_eq!(r.output(), &[1, 2, 3]);
                assert_eq!(r.gas_left, 100 - 18);
            }
            CallAction::Execute { .. } => panic!("precompile runs natively"),
        }
    }

    #[test]
    fn world_json_roundtrip() {
        let text = r#"{"accounts": {"0x0000000000000000000000000000000000000001": {
            "nonce": 2, "balance": "0x10", "code": "0x6001", "storage": {"0x1": "0x2a"}}}}"#;
        let world = World::from_json(text).unwrap();
        let acc = &world.accounts[&addr(1)];
        assert_eq!(acc.nonce, 2);
        assert_eq!(acc.balance, U256::from(16));
        assert_eq!(acc.code, vec![0x60, 0x01]);
        assert_eq!(acc.storage_value(&U256::one()), U256::from(42));
        assert_eq!(World::from_json(&world.to_json().unwrap()).unwrap(), world);
    }

    #[test]
    fn bad_world_json() {
        assert!(matches!(World::from_json("{"), Err(EvmError::Json(_))));
        assert!(matches!(
            World::from_json(r#"{"accounts": {"0x01": {}}}"#),
            Err(EvmError::InvalidAddress(_))
        ));
    }
}
