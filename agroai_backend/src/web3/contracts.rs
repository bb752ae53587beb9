//! Typed bindings for the AgroAI contracts.

use ethers::prelude::abigen;

abigen!(
    AgroToken,
    r#"[
        function rewardPhotoUpload(address farmer)
        function rewardDiseaseDetection(address farmer, bool isEarlyDetection, string disease)
        function processPurchase(address buyer, uint256 amount)
        function balanceOf(address account) view returns (uint256)
        function getUserStats(address account) view returns (uint256, uint256, uint256, uint256, uint256, uint256, uint256)
    ]"#
);

abigen!(
    AgroCore,
    r#"[
        function requestPhotoAnalysis(string backendUrl, string ipfsHash, string cropType, string location, string latitude, string longitude)
    ]"#
);
