//! The `GasHelper` contract overlaid onto the EntryPoint address during
//! call-gas binary search (§4.3.2 strategy B). Opaque to this crate: it
//! deploys `initCode` when the op's nonce is zero, invokes the account with
//! a caller-supplied `callGasLimit`, and reports `(success, gasUsed,
//! returnData)` without ever touching real chain state (state-override
//! only).

/// Carried verbatim from the reference implementation that originated this
/// bytecode; do not hand-edit.
pub const GAS_HELPER_BYTECODE_HEX: &str = "608060405234801561000f575f80fd5b5060043610610034575f3560e01c80632ab48e8214610038578063570e1a3614610063575b5f80fd5b61004b610046366004610261565b61008e565b60405161005a939291906102e6565b60405180910390f35b610076610071366004610343565b61017d565b6040516001600160a01b03909116815260200161005a565b5f80606086156100ff57604051632b870d1b60e11b8152309063570e1a36906100bd908b908b90600401610382565b6020604051808303815f875af11580156100d9573d5f803e3d5ffd5b505050506040513d601f19601f820116820180604052508101906100fd91906103b0565b505b5f5a9050896001600160a01b031685888860405161011e9291906103d2565b5f604051808303815f8787f1925050503d805f8114610158576040519150601f19603f3d011682016040523d82523d5f602084013e61015d565b606091505b5090945091505a61016e90826103e1565b92505096509650969350505050565b5f8061018c6014828587610406565b6101959161042d565b60601c90505f6101a88460148188610406565b8080601f0160208091040260200160405190810160405280939291908181526020018383808284375f92018290525084519495509360209350849250905082850182875af190505f519350806101fc575f93505b50505092915050565b6001600160a01b0381168114610219575f80fd5b50565b5f8083601f84011261022c575f80fd5b50813567ffffffffffffffff811115610243575f80fd5b60208301915083602082850101111561025a575f80fd5b9250929050565b5f805f805f8060808789031215610276575f80fd5b863561028181610205565b9550602087013567ffffffffffffffff8082111561029d575f80fd5b6102a98a838b0161021c565b909750955060408901359150808211156102c1575f80fd5b506102ce89828a0161021c565b979a9699509497949695606090950135949350505050565b83151581525f60208460208401526060604084015283518060608501525f5b8181101561032157858101830151858201608001528201610305565b505f608082860101526080601f19601f83011685010192505050949350505050565b5f8060208385031215610354575f80fd5b823567ffffffffffffffff81111561036a575f80fd5b6103768582860161021c565b90969095509350505050565b60208152816020820152818360408301375f818301604090810191909152601f909201601f19160101919050565b5f602082840312156103c0575f80fd5b81516103cb81610205565b9392505050565b818382375f9101908152919050565b8181038181111561040057634e487b7160e01b5f52601160045260245ffd5b92915050565b5f8085851115610414575f80fd5b83861115610420575f80fd5b5050820193919092039150565b6bffffffffffffffffffffffff19813581811691601485101561045a5780818660140360031b1b83161692505b50509291505056fea2646970667358221220c1f32188b95def9ba16ddcd88c16ae85d53bdec7f0d7ff767d14629aa9489aca64736f6c63430008160033";
