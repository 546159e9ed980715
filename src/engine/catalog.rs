//! Supported resource types and their deletion order
//!
//! The catalog is a hand-curated total order, not a computed graph: provider
//! dependency graphs are not introspectable, so the order encodes the known
//! constraints directly. Networking edges (gateways, addresses, endpoints)
//! come before routing and security constructs, those before subnets, those
//! before the enclosing VPC; identity and storage types trail as independent
//! groups. Deleting out of order fails at the provider, so changing this
//! order is a behavioral change, not a cleanup.

/// Dependent sub-resources implied by deleting a parent of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependents {
    /// Hosted zone records, emitted as `aws_route53_record`.
    ZoneRecords,
    /// EFS mount targets, emitted as `aws_efs_mount_target`.
    MountTargets,
    /// Managed policies attached to a user, emitted as
    /// `aws_iam_user_policy_attachment`.
    UserPolicies,
    /// Managed and inline policies attached to a role, emitted as
    /// `aws_iam_role_policy_attachment` and `aws_iam_role_policy`.
    RolePolicies,
    /// Entities a managed policy is attached to, emitted as
    /// `aws_iam_policy_attachment`.
    PolicyAttachments,
}

/// One supported resource type.
#[derive(Debug, Clone, Copy)]
pub struct ResourceDescriptor {
    pub terraform_type: &'static str,
    pub dependents: Option<Dependents>,
}

const fn plain(terraform_type: &'static str) -> ResourceDescriptor {
    ResourceDescriptor {
        terraform_type,
        dependents: None,
    }
}

const fn with_dependents(
    terraform_type: &'static str,
    dependents: Dependents,
) -> ResourceDescriptor {
    ResourceDescriptor {
        terraform_type,
        dependents: Some(dependents),
    }
}

/// All supported types, in deletion order.
pub const CATALOG: &[ResourceDescriptor] = &[
    plain("aws_autoscaling_group"),
    plain("aws_launch_configuration"),
    plain("aws_instance"),
    plain("aws_internet_gateway"),
    plain("aws_eip"),
    plain("aws_elb"),
    plain("aws_vpc_endpoint"),
    plain("aws_nat_gateway"),
    plain("aws_network_interface"),
    plain("aws_route_table"),
    plain("aws_security_group"),
    plain("aws_network_acl"),
    plain("aws_subnet"),
    with_dependents("aws_route53_zone", Dependents::ZoneRecords),
    plain("aws_vpc"),
    with_dependents("aws_efs_file_system", Dependents::MountTargets),
    with_dependents("aws_iam_user", Dependents::UserPolicies),
    with_dependents("aws_iam_role", Dependents::RolePolicies),
    with_dependents("aws_iam_policy", Dependents::PolicyAttachments),
    plain("aws_iam_instance_profile"),
    plain("aws_ebs_snapshot"),
    plain("aws_ebs_volume"),
    plain("aws_ami"),
];

/// Type names in deletion order, for help text and the wipe-all command.
pub fn supported_types() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(|d| d.terraform_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(terraform_type: &str) -> usize {
        CATALOG
            .iter()
            .position(|d| d.terraform_type == terraform_type)
            .unwrap_or_else(|| panic!("{terraform_type} not in catalog"))
    }

    #[test]
    fn gateways_before_subnets() {
        assert!(position("aws_internet_gateway") < position("aws_subnet"));
        assert!(position("aws_nat_gateway") < position("aws_subnet"));
        assert!(position("aws_vpc_endpoint") < position("aws_subnet"));
    }

    #[test]
    fn routing_and_security_before_subnets() {
        assert!(position("aws_route_table") < position("aws_subnet"));
        assert!(position("aws_security_group") < position("aws_subnet"));
        assert!(position("aws_network_acl") < position("aws_subnet"));
    }

    #[test]
    fn subnets_before_vpc() {
        assert!(position("aws_subnet") < position("aws_vpc"));
    }

    #[test]
    fn instances_before_security_groups() {
        assert!(position("aws_instance") < position("aws_security_group"));
    }

    #[test]
    fn dependent_bearing_types_are_flagged() {
        let flagged: Vec<_> = CATALOG
            .iter()
            .filter(|d| d.dependents.is_some())
            .map(|d| d.terraform_type)
            .collect();
        assert_eq!(
            flagged,
            [
                "aws_route53_zone",
                "aws_efs_file_system",
                "aws_iam_user",
                "aws_iam_role",
                "aws_iam_policy",
            ]
        );
    }

    #[test]
    fn no_duplicate_types() {
        let mut seen = std::collections::HashSet::new();
        for descriptor in CATALOG {
            assert!(
                seen.insert(descriptor.terraform_type),
                "duplicate catalog entry: {}",
                descriptor.terraform_type
            );
        }
    }
}
