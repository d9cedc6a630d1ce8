//! Lab entities: the catalog (facilities, equipment, reagents), procedures
//! (SOPs, templates) and experiment records.

lab_entity! {
    /// A room or shared space where work happens.
    Facility, FacilityDraft, FacilityPatch {
        kind: Facility,
        order: ByLabel,
        label: name,
    }
    fields {
        name: String = String::new(),
        facility_type: String = "other".to_string(),
        location: String = String::new(),
        access_conditions: String = String::new(),
        bsl_level: String = "n/a".to_string(),
        hours: String = String::new(),
        manager: String = String::new(),
        emergency_contact: String = String::new(),
        rules_summary: String = String::new(),
        incident_response: String = String::new(),
        waste_flow: String = String::new(),
        /// Free-text, comma-separated tags.
        tags: String = String::new(),
    }
}

lab_entity! {
    /// An instrument or device in the catalog.
    Equipment, EquipmentDraft, EquipmentPatch {
        kind: Equipment,
        order: ByLabel,
        label: name,
    }
    fields {
        name: String = String::new(),
        model_vendor: String = String::new(),
        /// Institutional asset number.
        asset_no: String = String::new(),
        status: String = "in use".to_string(),
        domain: String = "shared".to_string(),
        hazards: String = String::new(),
        facility_id: Option<i64> = None,
        location_detail: String = String::new(),
        owner: String = String::new(),
        training_required: bool = false,
        usage_frequency: String = "irregular".to_string(),
        key_parameters: String = String::new(),
        precheck_summary: String = String::new(),
        postclean_summary: String = String::new(),
        maintenance_cycle: String = "quarterly".to_string(),
        last_maintenance_date: String = String::new(),
        next_maintenance_date: String = String::new(),
        manual_url: String = String::new(),
        tags: String = String::new(),
        body_markdown: String = String::new(),
    }
}

lab_entity! {
    /// A reagent lot in stock.
    Reagent, ReagentDraft, ReagentPatch {
        kind: Reagent,
        order: ByLabel,
        label: name,
    }
    fields {
        name: String = String::new(),
        category: String = "other".to_string(),
        vendor: String = String::new(),
        /// Vendor catalog number.
        cat_no: String = String::new(),
        lot_no: String = String::new(),
        concentration_form: String = String::new(),
        storage_temp: String = "RT".to_string(),
        light_sensitive: bool = false,
        open_date: String = String::new(),
        expiry_date: String = String::new(),
        stock_status: String = "normal".to_string(),
        min_stock: i32 = 0,
        qty_est: i32 = 0,
        storage_location: String = String::new(),
        hazards: String = String::new(),
        ppe: String = String::new(),
        sds_url: String = String::new(),
        prep_dilution: String = String::new(),
        usage_summary: String = String::new(),
        cautions: String = String::new(),
        tags: String = String::new(),
        body_markdown: String = String::new(),
    }
}

lab_entity! {
    /// A standard operating procedure.
    Sop, SopDraft, SopPatch {
        kind: Sop,
        order: ByLabel,
        label: title,
    }
    fields {
        title: String = String::new(),
        version: String = "v1.0".to_string(),
        domain: String = "shared".to_string(),
        summary: String = String::new(),
        body_markdown: String = String::new(),
        tags: String = String::new(),
    }
}

lab_entity! {
    /// A reusable skeleton for experiment records.
    ExperimentTemplate, ExperimentTemplateDraft, ExperimentTemplatePatch {
        kind: Template,
        order: NewestFirst,
        label: title,
    }
    fields {
        title: String = String::new(),
        experiment_type: String = "other".to_string(),
        summary: String = String::new(),
        body_markdown: String = String::new(),
        tags: String = String::new(),
    }
}

lab_entity! {
    /// One experiment run. Owns its equipment and reagent links.
    ExperimentRecord, ExperimentRecordDraft, ExperimentRecordPatch {
        kind: Record,
        order: NewestFirst,
        label: title,
    }
    fields {
        title: String = String::new(),
        date: String = String::new(),
        performer: String = String::new(),
        project: String = String::new(),
        experiment_type: String = "other".to_string(),
        purpose: String = String::new(),
        status: String = "completed".to_string(),
        sample_summary: String = String::new(),
        key_parameters: String = String::new(),
        method_markdown: String = String::new(),
        results_summary: String = String::new(),
        conclusion: String = String::new(),
        issues_deviation: String = String::new(),
        followup_recommendations: String = String::new(),
        raw_data_url: String = String::new(),
        tags: String = String::new(),
        sop_id: Option<i64> = None,
        template_id: Option<i64> = None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sort_for_listing, Entity, ValidationError};
    use chrono::{TimeZone, Utc};

    fn t0() -> crate::Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_default()
    }

    fn t1() -> crate::Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).single().unwrap_or_default()
    }

    #[test]
    fn test_draft_defaults_fill_missing_fields() -> Result<(), serde_json::Error> {
        let draft: EquipmentDraft = serde_json::from_str(r#"{"name": "Centrifuge"}"#)?;
        assert_eq!(draft.name, "Centrifuge");
        assert_eq!(draft.status, "in use");
        assert_eq!(draft.domain, "shared");
        assert_eq!(draft.facility_id, None);
        assert!(!draft.training_required);

        let reagent: ReagentDraft = serde_json::from_str(r#"{"name": "Trypsin"}"#)?;
        assert_eq!(reagent.storage_temp, "RT");
        assert_eq!(reagent.stock_status, "normal");
        Ok(())
    }

    #[test]
    fn test_draft_ignores_caller_supplied_id() -> Result<(), serde_json::Error> {
        let draft: ExperimentRecordDraft =
            serde_json::from_str(r#"{"id": 99, "title": "PCR run"}"#)?;
        let record = ExperimentRecord::from_draft(1, draft, t0());
        assert_eq!(record.id, 1);
        assert_eq!(record.status, "completed");
        assert_eq!(record.created_at, record.updated_at);
        Ok(())
    }

    #[test]
    fn test_patch_only_touches_present_fields() -> Result<(), serde_json::Error> {
        let mut eq = Equipment::from_draft(
            3,
            EquipmentDraft {
                name: "Microscope".to_string(),
                facility_id: Some(2),
                ..Default::default()
            },
            t0(),
        );

        let patch: EquipmentPatch =
            serde_json::from_str(r#"{"id": 50, "status": "broken"}"#)?;
        eq.apply_patch(patch, t1());

        assert_eq!(eq.id, 3);
        assert_eq!(eq.name, "Microscope");
        assert_eq!(eq.status, "broken");
        assert_eq!(eq.facility_id, Some(2));
        assert_eq!(eq.created_at, t0());
        assert_eq!(eq.updated_at, t1());
        Ok(())
    }

    #[test]
    fn test_patch_explicit_null_clears_optional_reference() -> Result<(), serde_json::Error> {
        let mut eq = Equipment::from_draft(
            1,
            EquipmentDraft {
                name: "Hood".to_string(),
                facility_id: Some(9),
                ..Default::default()
            },
            t0(),
        );
        let patch: EquipmentPatch = serde_json::from_str(r#"{"facility_id": null}"#)?;
        eq.apply_patch(patch, t1());
        assert_eq!(eq.facility_id, None);
        Ok(())
    }

    #[test]
    fn test_replace_overwrites_everything_but_identity() {
        let mut record = ExperimentRecord::from_draft(
            5,
            ExperimentRecordDraft {
                title: "Western blot".to_string(),
                purpose: "protein check".to_string(),
                sop_id: Some(1),
                ..Default::default()
            },
            t0(),
        );

        record.replace(
            ExperimentRecordDraft {
                title: "Western blot v2".to_string(),
                ..Default::default()
            },
            t1(),
        );

        assert_eq!(record.id, 5);
        assert_eq!(record.title, "Western blot v2");
        assert_eq!(record.purpose, "");
        assert_eq!(record.sop_id, None);
        assert_eq!(record.created_at, t0());
        assert_eq!(record.updated_at, t1());
    }

    #[test]
    fn test_blank_label_is_rejected() {
        let draft = SopDraft::default();
        assert!(matches!(
            Sop::check_draft(&draft),
            Err(ValidationError::RequiredFieldMissing { .. })
        ));

        let patch = FacilityPatch {
            name: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(Facility::check_patch(&patch).is_err());
        assert!(Facility::check_patch(&FacilityPatch::default()).is_ok());
    }

    #[test]
    fn test_listing_orders() {
        let mk = |id: i64, name: &str| {
            Reagent::from_draft(
                id,
                ReagentDraft {
                    name: name.to_string(),
                    ..Default::default()
                },
                t0(),
            )
        };
        let mut reagents = vec![mk(1, "Tris"), mk(2, "Agarose"), mk(3, "Tris")];
        sort_for_listing(&mut reagents);
        let ids: Vec<i64> = reagents.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);

        let mk_rec = |id: i64| {
            ExperimentRecord::from_draft(
                id,
                ExperimentRecordDraft {
                    title: "r".to_string(),
                    ..Default::default()
                },
                t0(),
            )
        };
        let mut records = vec![mk_rec(1), mk_rec(3), mk_rec(2)];
        sort_for_listing(&mut records);
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_fields_exclude_identity_and_timestamps() {
        assert!(!ExperimentRecord::FIELDS.contains(&"id"));
        assert!(!ExperimentRecord::FIELDS.contains(&"created_at"));
        assert!(ExperimentRecord::FIELDS.contains(&"sop_id"));
        assert_eq!(Sop::LABEL_FIELD, "title");
    }
}
