//! Static HTML report generation from a positions snapshot bundle.

use session_stakes::amount::format_sent;
use session_stakes::node::state::{contract_state, stake_state};
use session_stakes::node::total_staked_for_address;
use session_stakes::{ReadyContract, ReportData, Stake};
use std::io::Write;
use std::path::Path;

/// Render a static HTML report to `out_path`. Embeds the full bundle JSON for
/// verification.
pub fn render_report(data: &ReportData, out_path: impl AsRef<Path>) -> Result<(), ReportError> {
    let html = build_html(data)?;
    let mut f = std::fs::File::create(out_path.as_ref()).map_err(ReportError::Io)?;
    f.write_all(html.as_bytes()).map_err(ReportError::Io)?;
    Ok(())
}

/// Build the HTML string from report data (for testing or in-memory use).
pub fn build_html(data: &ReportData) -> Result<String, ReportError> {
    let bundle = &data.bundle;
    let json_embed = escape_html(&serde_json::to_string(&data).map_err(ReportError::Json)?);
    let addr = escape_html(&bundle.address);
    let hash = escape_html(&data.reproducibility_hash_sha256);

    let total_staked: u128 = bundle
        .stakes
        .iter()
        .map(|s| total_staked_for_address(&s.contributors, &bundle.address))
        .sum();

    let stake_cards: String = bundle
        .stakes
        .iter()
        .map(|s| stake_card(s, &bundle.address, bundle.block_height))
        .collect();
    let visible_cards: String = bundle
        .visible_contracts
        .iter()
        .map(|c| contract_card(c, &bundle.address))
        .collect();
    let joining_cards: String = bundle
        .joining_contracts
        .iter()
        .map(|c| contract_card(c, &bundle.address))
        .collect();
    let hidden_section = if bundle.hidden_contracts_with_stakes.is_empty() {
        String::new()
    } else {
        let cards: String = bundle
            .hidden_contracts_with_stakes
            .iter()
            .map(|c| contract_card(c, &bundle.address))
            .collect();
        format!(
            r#"<h2>Duplicate contracts holding your stake</h2>
<p class="warn">These contracts are superseded by a newer record but still hold a contribution from your address.</p>
{cards}"#
        )
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8"/>
<meta name="viewport" content="width=device-width,initial-scale=1"/>
<title>Staked Nodes – {addr}</title>
<style>
:root {{ font-family: system-ui, sans-serif; background: #0f1419; color: #e6edf3; }}
body {{ max-width: 720px; margin: 0 auto; padding: 1.5rem; }}
h1 {{ font-size: 1.4rem; margin-bottom: 0.5rem; }}
h2 {{ font-size: 1.1rem; margin-top: 1.5rem; color: #8b949e; }}
.mono {{ font-family: ui-monospace, monospace; font-size: 0.9em; word-break: break-all; }}
.card {{ background: #161b22; border: 1px solid #30363d; border-radius: 6px; padding: 1rem; margin: 0.5rem 0; }}
.grid {{ display: grid; grid-template-columns: auto 1fr; gap: 0.25rem 1rem; }}
.label {{ color: #8b949e; }}
.badge {{ display: inline-block; padding: 0.1rem 0.5rem; border-radius: 1rem; background: #1f6feb33; font-size: 0.85em; }}
.warn {{ color: #d29922; font-size: 0.9rem; }}
.hash {{ font-size: 0.85em; }}
.footer {{ margin-top: 2rem; font-size: 0.85rem; color: #8b949e; }}
</style>
</head>
<body>
<h1>Staked Nodes</h1>
<p class="mono">{addr}</p>
<p>Generated: {created} · Block height {block_height}</p>

<h2>Summary</h2>
<div class="card">
  <div class="grid">
    <span class="label">Your total staked</span><span class="mono">{total_staked}</span>
    <span class="label">Stakes</span><span>{stake_count}</span>
    <span class="label">Open contracts</span><span>{visible_count}</span>
    <span class="label">Joining</span><span>{joining_count}</span>
    <span class="label">Vesting positions</span><span>{vesting_count}</span>
    <span class="label">Nodes live in network</span><span>{network_count}</span>
  </div>
</div>

<h2>Stakes</h2>
{stake_cards}

<h2>Open contribution contracts</h2>
{visible_cards}

<h2>Joining the network</h2>
{joining_cards}
{hidden_section}

<h2>Reproducibility</h2>
<div class="card">
  <div class="mono hash">SHA-256: {hash}</div>
  <p class="footer">Re-run <code>session-stakes verify --bundle &lt;file&gt;</code> and compare the hash.</p>
</div>

<h2>Snapshot bundle (embedded)</h2>
<div class="card">
  <p class="footer">The full snapshot bundle is embedded below for verification. Do not edit.</p>
  <script type="application/json" id="snapshot-bundle">{json_embed}</script>
</div>

<div class="footer">
  <p>Generated by session-stakes. Read-only tool; no keys; no signing.</p>
</div>
</body>
</html>"#,
        addr = addr,
        created = escape_html(&bundle.created_utc_rfc3339),
        block_height = bundle.block_height,
        total_staked = escape_html(&format_sent(total_staked, 2)),
        stake_count = bundle.stakes.len(),
        visible_count = bundle.visible_contracts.len(),
        joining_count = bundle.joining_contracts.len(),
        vesting_count = bundle.vesting.len(),
        network_count = bundle.network_bls_keys.len(),
        stake_cards = stake_cards,
        visible_cards = visible_cards,
        joining_cards = joining_cards,
        hidden_section = hidden_section,
        hash = hash,
        json_embed = json_embed,
    );
    Ok(html)
}

fn stake_card(stake: &Stake, address: &str, block_height: u64) -> String {
    let state = stake_state(stake, block_height);
    let yours = total_staked_for_address(&stake.contributors, address);
    let fee = stake
        .operator_fee
        .map(|bp| format!("{:.2}%", f64::from(bp) / 100.0))
        .unwrap_or_else(|| "—".to_string());
    format!(
        r#"<div class="card">
  <span class="badge">{state}</span>
  <div class="grid">
    <span class="label">SN key</span><span class="mono">{sn_key}</span>
    <span class="label">BLS key</span><span class="mono">{bls_key}</span>
    <span class="label">Your stake</span><span class="mono">{yours}</span>
    <span class="label">Operator fee</span><span>{fee}</span>
  </div>
</div>
"#,
        state = state,
        sn_key = escape_html(&stake.service_node_pubkey),
        bls_key = escape_html(&stake.pubkey_bls),
        yours = escape_html(&format_sent(yours, 2)),
        fee = fee,
    )
}

fn contract_card(contract: &ReadyContract, address: &str) -> String {
    let state = contract_state(contract);
    let yours = total_staked_for_address(&contract.contributors, address);
    format!(
        r#"<div class="card">
  <span class="badge">{state}</span>
  <div class="grid">
    <span class="label">Contract</span><span class="mono">{contract_addr}</span>
    <span class="label">BLS key</span><span class="mono">{bls_key}</span>
    <span class="label">Your contribution</span><span class="mono">{yours}</span>
    <span class="label">Operator fee</span><span>{fee:.2}%</span>
  </div>
</div>
"#,
        state = state,
        contract_addr = escape_html(&contract.address),
        bls_key = escape_html(&contract.pubkey_bls),
        yours = escape_html(&format_sent(yours, 2)),
        fee = f64::from(contract.fee) / 100.0,
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug)]
pub enum ReportError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Io(e) => write!(f, "io: {}", e),
            ReportError::Json(e) => write!(f, "json: {}", e),
        }
    }
}

impl std::error::Error for ReportError {}
