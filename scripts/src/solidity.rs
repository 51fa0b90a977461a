//! Definitions of Solidity functions called during deployment

use ethers::contract::abigen;

abigen!(
    ControllerContract,
    r#"[
        function setInterestRateModel(uint256 baseRate, uint256 kinkRate, uint256 slope1, uint256 slope2) external
        function setOperator(address operator) external
    ]"#,
);

abigen!(
    VaultNftContract,
    r#"[
        function init(address controller) external
    ]"#,
);

abigen!(
    ProxyAdminContract,
    r#"[
        function upgradeAndCall(address proxy, address implementation, bytes memory data) external
    ]"#,
);

abigen!(
    MockErc20Contract,
    r#"[
        function balanceOf(address account) external view returns (uint256)
        function mint(address to, uint256 amount) external
    ]"#
);
