//! Resource catalogues and destruction ordering
//!
//! Every resource kind belongs to exactly one of two catalogues: the
//! deletable catalogue, ordered into destruction phases, or the
//! always-preserved catalogue (identity, organization, DNS, billing),
//! which the engine never destroys regardless of tags.

use serde::{Deserialize, Serialize};

/// Kinds of account resources handled by the sweep engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// EC2 instance (must terminate before volumes detach and networking goes)
    Ec2Instance,
    /// Lambda function
    LambdaFunction,
    /// RDS database instance
    RdsInstance,
    /// RDS database cluster
    RdsCluster,
    /// ECS cluster
    EcsCluster,
    /// S3 bucket (global, not region-scoped)
    S3Bucket,
    /// EBS volume (deleted after the compute that attaches it)
    EbsVolume,
    /// EBS snapshot
    EbsSnapshot,
    /// CloudFormation stack (tier-ordered within its phase)
    CloudFormationStack,
    /// NAT gateway (first networking tier)
    NatGateway,
    /// Internet gateway (after NAT gateways)
    InternetGateway,
    /// Security group (after gateways, before the VPC)
    SecurityGroup,
    /// VPC (last, nothing may still reference it)
    Vpc,

    // Always-preserved catalogue
    /// IAM role
    IamRole,
    /// IAM user
    IamUser,
    /// IAM policy
    IamPolicy,
    /// Organizations organizational unit
    OrganizationalUnit,
    /// Route 53 hosted zone
    HostedZone,
    /// Route 53 registered domain
    RegisteredDomain,
    /// Budgets construct
    Budget,
    /// Savings Plan
    SavingsPlan,
}

impl ResourceKind {
    /// True for kinds in the always-preserved catalogue.
    ///
    /// Identity scaffolding, organization structure, DNS, and billing
    /// constructs survive decommissioning unconditionally.
    pub fn is_protected(self) -> bool {
        matches!(
            self,
            ResourceKind::IamRole
                | ResourceKind::IamUser
                | ResourceKind::IamPolicy
                | ResourceKind::OrganizationalUnit
                | ResourceKind::HostedZone
                | ResourceKind::RegisteredDomain
                | ResourceKind::Budget
                | ResourceKind::SavingsPlan
        )
    }

    /// True for kinds that are account-global rather than region-scoped.
    pub fn is_global(self) -> bool {
        matches!(
            self,
            ResourceKind::S3Bucket
                | ResourceKind::IamRole
                | ResourceKind::IamUser
                | ResourceKind::IamPolicy
                | ResourceKind::OrganizationalUnit
                | ResourceKind::HostedZone
                | ResourceKind::RegisteredDomain
                | ResourceKind::Budget
                | ResourceKind::SavingsPlan
        )
    }

    /// Destruction phase index (lower = destroyed first)
    ///
    /// Phases encode the dependency table:
    /// - 0: compute, serverless, databases, container clusters, buckets
    /// - 1: block volumes and snapshots (after compute detaches them)
    /// - 2: CloudFormation stacks (tier-ordered within the phase)
    /// - 3: NAT gateways
    /// - 4: internet gateways (after NAT)
    /// - 5: security groups (after gateways)
    /// - 6: VPCs (nothing may still reference them)
    ///
    /// Networking tiers are separate phases so the inter-phase barrier
    /// enforces the gateway → group → network order mechanically.
    ///
    /// Returns `None` for the always-preserved catalogue, which never
    /// enters a destruction plan.
    pub fn destruction_phase(self) -> Option<u8> {
        match self {
            ResourceKind::Ec2Instance
            | ResourceKind::LambdaFunction
            | ResourceKind::RdsInstance
            | ResourceKind::RdsCluster
            | ResourceKind::EcsCluster
            | ResourceKind::S3Bucket => Some(0),
            ResourceKind::EbsVolume | ResourceKind::EbsSnapshot => Some(1),
            ResourceKind::CloudFormationStack => Some(2),
            ResourceKind::NatGateway => Some(3),
            ResourceKind::InternetGateway => Some(4),
            ResourceKind::SecurityGroup => Some(5),
            ResourceKind::Vpc => Some(6),
            _ => None,
        }
    }

    /// Stable string form for journals and reports
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Ec2Instance => "ec2_instance",
            ResourceKind::LambdaFunction => "lambda_function",
            ResourceKind::RdsInstance => "rds_instance",
            ResourceKind::RdsCluster => "rds_cluster",
            ResourceKind::EcsCluster => "ecs_cluster",
            ResourceKind::S3Bucket => "s3_bucket",
            ResourceKind::EbsVolume => "ebs_volume",
            ResourceKind::EbsSnapshot => "ebs_snapshot",
            ResourceKind::CloudFormationStack => "cloudformation_stack",
            ResourceKind::NatGateway => "nat_gateway",
            ResourceKind::InternetGateway => "internet_gateway",
            ResourceKind::SecurityGroup => "security_group",
            ResourceKind::Vpc => "vpc",
            ResourceKind::IamRole => "iam_role",
            ResourceKind::IamUser => "iam_user",
            ResourceKind::IamPolicy => "iam_policy",
            ResourceKind::OrganizationalUnit => "organizational_unit",
            ResourceKind::HostedZone => "hosted_zone",
            ResourceKind::RegisteredDomain => "registered_domain",
            ResourceKind::Budget => "budget",
            ResourceKind::SavingsPlan => "savings_plan",
        }
    }

    /// Parse the stable string form back into a kind
    pub fn parse(s: &str) -> Option<Self> {
        let kind = match s {
            "ec2_instance" => ResourceKind::Ec2Instance,
            "lambda_function" => ResourceKind::LambdaFunction,
            "rds_instance" => ResourceKind::RdsInstance,
            "rds_cluster" => ResourceKind::RdsCluster,
            "ecs_cluster" => ResourceKind::EcsCluster,
            "s3_bucket" => ResourceKind::S3Bucket,
            "ebs_volume" => ResourceKind::EbsVolume,
            "ebs_snapshot" => ResourceKind::EbsSnapshot,
            "cloudformation_stack" => ResourceKind::CloudFormationStack,
            "nat_gateway" => ResourceKind::NatGateway,
            "internet_gateway" => ResourceKind::InternetGateway,
            "security_group" => ResourceKind::SecurityGroup,
            "vpc" => ResourceKind::Vpc,
            "iam_role" => ResourceKind::IamRole,
            "iam_user" => ResourceKind::IamUser,
            "iam_policy" => ResourceKind::IamPolicy,
            "organizational_unit" => ResourceKind::OrganizationalUnit,
            "hosted_zone" => ResourceKind::HostedZone,
            "registered_domain" => ResourceKind::RegisteredDomain,
            "budget" => ResourceKind::Budget,
            "savings_plan" => ResourceKind::SavingsPlan,
            _ => return None,
        };
        Some(kind)
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELETABLE: &[ResourceKind] = &[
        ResourceKind::Ec2Instance,
        ResourceKind::LambdaFunction,
        ResourceKind::RdsInstance,
        ResourceKind::RdsCluster,
        ResourceKind::EcsCluster,
        ResourceKind::S3Bucket,
        ResourceKind::EbsVolume,
        ResourceKind::EbsSnapshot,
        ResourceKind::CloudFormationStack,
        ResourceKind::NatGateway,
        ResourceKind::InternetGateway,
        ResourceKind::SecurityGroup,
        ResourceKind::Vpc,
    ];

    const PROTECTED: &[ResourceKind] = &[
        ResourceKind::IamRole,
        ResourceKind::IamUser,
        ResourceKind::IamPolicy,
        ResourceKind::OrganizationalUnit,
        ResourceKind::HostedZone,
        ResourceKind::RegisteredDomain,
        ResourceKind::Budget,
        ResourceKind::SavingsPlan,
    ];

    #[test]
    fn catalogues_are_disjoint() {
        for kind in DELETABLE {
            assert!(!kind.is_protected(), "{kind} must be deletable");
            assert!(
                kind.destruction_phase().is_some(),
                "{kind} must have a phase"
            );
        }
        for kind in PROTECTED {
            assert!(kind.is_protected(), "{kind} must be protected");
            assert!(
                kind.destruction_phase().is_none(),
                "{kind} must never enter a plan"
            );
        }
    }

    #[test]
    fn compute_before_volumes() {
        assert!(
            ResourceKind::Ec2Instance.destruction_phase()
                < ResourceKind::EbsVolume.destruction_phase(),
            "Instances must terminate before their volumes are deleted"
        );
        assert!(
            ResourceKind::LambdaFunction.destruction_phase()
                < ResourceKind::EbsSnapshot.destruction_phase()
        );
    }

    #[test]
    fn databases_before_networking() {
        assert!(
            ResourceKind::RdsInstance.destruction_phase() < ResourceKind::Vpc.destruction_phase()
        );
        assert!(
            ResourceKind::RdsCluster.destruction_phase()
                < ResourceKind::SecurityGroup.destruction_phase()
        );
    }

    #[test]
    fn stacks_before_networking() {
        assert!(
            ResourceKind::CloudFormationStack.destruction_phase()
                < ResourceKind::NatGateway.destruction_phase()
        );
    }

    #[test]
    fn networking_sub_order() {
        // NAT gateways, then internet gateways, then security groups,
        // then the VPC itself.
        let nat = ResourceKind::NatGateway.destruction_phase();
        let igw = ResourceKind::InternetGateway.destruction_phase();
        let sg = ResourceKind::SecurityGroup.destruction_phase();
        let vpc = ResourceKind::Vpc.destruction_phase();
        assert!(nat < igw);
        assert!(igw < sg);
        assert!(sg < vpc);
    }

    #[test]
    fn string_roundtrip() {
        for kind in DELETABLE.iter().chain(PROTECTED) {
            assert_eq!(ResourceKind::parse(kind.as_str()), Some(*kind));
        }
        assert_eq!(ResourceKind::parse("unknown_kind"), None);
    }

    #[test]
    fn buckets_are_global() {
        assert!(ResourceKind::S3Bucket.is_global());
        assert!(!ResourceKind::Ec2Instance.is_global());
        assert!(!ResourceKind::Vpc.is_global());
    }
}
