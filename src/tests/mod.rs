// Tests module
// Integration: full pipeline scenarios over a synthetic state export
// Properties: sweep/supply reconciliation invariants under generated balances
